// --- File: crates/vacationstay_auth/src/doc.rs ---
#![cfg(feature = "openapi")]

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::logic::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, UserResponse};

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::register_handler,
        crate::handlers::login_handler,
        crate::handlers::me_handler,
        crate::handlers::update_me_handler
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            UserResponse,
            AuthResponse,
            vacationstay_db::Role,
            vacationstay_common::ErrorResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Accounts and bearer tokens")
    ),
    servers(
        (url = "/api", description = "VacationStay API")
    )
)]
pub struct AuthApiDoc;
