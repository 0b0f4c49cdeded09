//! SQL implementation of the user repository

use std::collections::BTreeSet;

use sqlx::any::AnyRow;
use tracing::{debug, info};

use crate::error::DbError;
use crate::models::{NewUser, Role, User, UserChanges};
use crate::query::{InsertQuery, TableQuery, UpdateQuery};
use crate::repositories::user::UserRepository;
use crate::row::{get_i64, get_opt_string, get_string, get_timestamp, now_timestamp};
use crate::DbClient;

const TABLE: &str = "users";

const COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "password_hash",
    "image_url",
    "provider",
    "provider_id",
    "roles",
    "created_at",
];

/// SQL implementation of the user repository
#[derive(Debug, Clone)]
pub struct SqlUserRepository {
    db_client: DbClient,
}

impl SqlUserRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn encode_roles(roles: &BTreeSet<Role>) -> String {
    if roles.is_empty() {
        return Role::User.as_str().to_string();
    }
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_roles(raw: &str) -> BTreeSet<Role> {
    let roles: BTreeSet<Role> = raw
        .split(',')
        .filter_map(|r| r.parse::<Role>().ok())
        .collect();
    if roles.is_empty() {
        BTreeSet::from([Role::User])
    } else {
        roles
    }
}

fn user_from_row(row: &AnyRow) -> Result<User, DbError> {
    Ok(User {
        id: get_i64(row, TABLE, "id")?,
        name: get_string(row, TABLE, "name")?,
        email: get_string(row, TABLE, "email")?,
        password_hash: get_opt_string(row, "password_hash"),
        image_url: get_opt_string(row, "image_url"),
        provider: get_string(row, TABLE, "provider")?,
        provider_id: get_opt_string(row, "provider_id"),
        roles: decode_roles(&get_opt_string(row, "roles").unwrap_or_default()),
        created_at: get_timestamp(row, "created_at"),
    })
}

impl UserRepository for SqlUserRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing user schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT,
                image_url TEXT,
                provider TEXT NOT NULL DEFAULT 'local',
                provider_id TEXT,
                roles TEXT NOT NULL DEFAULT 'USER',
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;

        info!("User schema initialized successfully");
        Ok(())
    }

    async fn create(&self, user: NewUser) -> Result<User, DbError> {
        debug!("Creating user with email: {}", user.email);

        let row = InsertQuery::insert_into(TABLE)
            .value("name", user.name)
            .value("email", user.email)
            .value("password_hash", user.password_hash)
            .value("image_url", user.image_url)
            .value("provider", user.provider)
            .value("provider_id", user.provider_id)
            .value("roles", encode_roles(&user.roles))
            .value("created_at", now_timestamp())
            .returning(COLUMNS)
            .fetch_one(&self.db_client)
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => DbError::Conflict("Email already in use".to_string()),
                other => other,
            })?;

        let created = user_from_row(&row)?;
        info!("User {} created", created.id);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        TableQuery::select(TABLE)
            .columns(COLUMNS)
            .eq("id", id)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        TableQuery::select(TABLE)
            .columns(COLUMNS)
            .eq("email", email)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DbError> {
        let row = TableQuery::select(TABLE)
            .columns(&["id"])
            .eq("email", email)
            .limit(1)
            .fetch_optional(&self.db_client)
            .await?;
        Ok(row.is_some())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DbError> {
        debug!("Updating user {}", id);

        let mut query = UpdateQuery::table(TABLE);
        let mut touched = false;
        if let Some(name) = changes.name {
            query = query.set("name", name);
            touched = true;
        }
        if let Some(hash) = changes.password_hash {
            query = query.set("password_hash", hash);
            touched = true;
        }
        if let Some(image_url) = changes.image_url {
            query = query.set("image_url", image_url);
            touched = true;
        }

        if !touched {
            return self.find_by_id(id).await;
        }

        query
            .eq("id", id)
            .returning(COLUMNS)
            .fetch_optional(&self.db_client)
            .await?
            .map(|row| user_from_row(&row))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LOCAL_PROVIDER;

    async fn repo() -> SqlUserRepository {
        let client = DbClient::from_url("sqlite::memory:").await.unwrap();
        let repo = SqlUserRepository::new(client);
        repo.init_schema().await.unwrap();
        repo
    }

    fn alice() -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: Some("pbkdf2$1$c2FsdA$aGFzaA".to_string()),
            image_url: None,
            provider: LOCAL_PROVIDER.to_string(),
            provider_id: None,
            roles: BTreeSet::from([Role::User]),
        }
    }

    #[test]
    fn roles_round_trip_through_text() {
        let roles = BTreeSet::from([Role::Admin, Role::User]);
        assert_eq!(encode_roles(&roles), "USER,ADMIN");
        assert_eq!(decode_roles("USER,ADMIN"), roles);
        assert_eq!(decode_roles("garbage"), BTreeSet::from([Role::User]));
    }

    #[tokio::test]
    async fn create_and_find_by_email() {
        let repo = repo().await;
        let created = repo.create(alice()).await.unwrap();

        let found = repo
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.is_local());
        assert!(found.image_url.is_none());
        assert!(found.created_at.is_some());
        assert!(repo.exists_by_email("alice@example.com").await.unwrap());
        assert!(!repo.exists_by_email("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let repo = repo().await;
        repo.create(alice()).await.unwrap();

        let err = repo.create(alice()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(msg) if msg == "Email already in use"));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let repo = repo().await;
        let created = repo.create(alice()).await.unwrap();

        let updated = repo
            .update(
                created.id,
                UserChanges {
                    image_url: Some("https://img.example.com/a.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.password_hash, created.password_hash);
        assert_eq!(
            updated.image_url.as_deref(),
            Some("https://img.example.com/a.png")
        );
        assert!(repo
            .update(9999, UserChanges {
                name: Some("Nobody".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .is_none());
    }
}
