//! PostgreSQL document store
//!
//! Each user is one row holding the whole document as JSONB. Unique fields
//! declared on the user shape get a unique expression index over the JSONB
//! key, named `users_<field>_key`; violations are mapped back to the field
//! through that name.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, info};
use uuid::Uuid;

use super::{UserStore, unique_change, unique_value};
use crate::error::{UserError, UserResult};
use crate::models::{Message, UpdateUser, User, UserFilter};
use crate::schema::USER_SHAPE;

const CREATE_COLLECTION: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        document JSONB NOT NULL
    )
"#;

/// User store backed by a JSONB column
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the collection table and one unique index per unique field.
    ///
    /// Safe to run repeatedly.
    pub async fn sync_indexes(&self) -> DatabaseResult<()> {
        sqlx::query(CREATE_COLLECTION)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(format!("users collection: {}", e)))?;

        for field in USER_SHAPE.unique_fields() {
            let index = index_name(field.name);
            let statement = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {} ON users ((document->>'{}'))",
                index, field.name
            );
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::Migration(format!("{}: {}", index, e)))?;
            info!("Ensured unique index {}", index);
        }

        Ok(())
    }
}

fn index_name(field: &str) -> String {
    format!("users_{}_key", field.to_lowercase())
}

fn field_for_index(index: &str) -> Option<&'static str> {
    USER_SHAPE
        .unique_fields()
        .find(|field| index_name(field.name) == index)
        .map(|field| field.name)
}

/// Translate a failed write into a duplicate-key error where possible.
///
/// `written` returns the value the write put into a unique field.
fn map_write_error<'a>(
    err: sqlx::Error,
    id: Uuid,
    written: impl Fn(&str) -> Option<&'a str>,
) -> UserError {
    let err = DatabaseError::Query(err);

    if let Some(constraint) = err.unique_violation() {
        if constraint == "users_pkey" {
            return UserError::Duplicate {
                field: "_id",
                value: id.to_string(),
            };
        }
        if let Some(field) = field_for_index(constraint) {
            return UserError::Duplicate {
                field,
                value: written(field).unwrap_or_default().to_string(),
            };
        }
    }

    UserError::Database(err)
}

fn filter_clause(filter: &UserFilter) -> (&'static str, &str) {
    match filter {
        UserFilter::Username(value) => ("document->>'username' = $1", value.as_str()),
        UserFilter::Email(value) => ("document->>'email' = $1", value.as_str()),
        UserFilter::UsernameOrEmail(value) => (
            "document->>'username' = $1 OR document->>'email' = $1",
            value.as_str(),
        ),
    }
}

impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> UserResult<()> {
        info!("Creating user document: {}", user.username);

        sqlx::query("INSERT INTO users (id, document) VALUES ($1, $2)")
            .bind(user.id)
            .bind(Json(user))
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, user.id, |field| unique_value(user, field)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        debug!("Finding user by ID: {}", id);

        let document =
            sqlx::query_scalar::<_, Json<User>>("SELECT document FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::Query)?;

        Ok(document.map(|Json(user)| user))
    }

    async fn find_one(&self, filter: &UserFilter) -> UserResult<Option<User>> {
        debug!("Finding user by {:?}", filter);

        let (clause, value) = filter_clause(filter);
        let statement = format!("SELECT document FROM users WHERE {} LIMIT 1", clause);

        let document = sqlx::query_scalar::<_, Json<User>>(&statement)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(document.map(|Json(user)| user))
    }

    async fn update_fields(&self, id: Uuid, changes: &UpdateUser) -> UserResult<Option<User>> {
        debug!("Updating user document: {}", id);

        let document = sqlx::query_scalar::<_, Json<User>>(
            "UPDATE users SET document = document || $2::jsonb WHERE id = $1 RETURNING document",
        )
        .bind(id)
        .bind(Json(changes))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, id, |field| unique_change(changes, field)))?;

        Ok(document.map(|Json(user)| user))
    }

    async fn push_message(&self, id: Uuid, message: &Message) -> UserResult<Option<User>> {
        let document = sqlx::query_scalar::<_, Json<User>>(
            r#"
            UPDATE users
            SET document = jsonb_set(
                document,
                '{messages}',
                COALESCE(document->'messages', '[]'::jsonb) || jsonb_build_array($2::jsonb)
            )
            WHERE id = $1
            RETURNING document
            "#,
        )
        .bind(id)
        .bind(Json(message))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(document.map(|Json(user)| user))
    }

    async fn remove_message(&self, id: Uuid, index: usize) -> UserResult<Message> {
        let position = i32::try_from(index).map_err(|_| UserError::MessageNotFound { index })?;

        let message = sqlx::query_scalar::<_, Json<Message>>(
            r#"
            WITH target AS (
                SELECT id, document->'messages'->$2::int AS message
                FROM users
                WHERE id = $1
                FOR UPDATE
            )
            UPDATE users
            SET document = jsonb_set(users.document, '{messages}', (users.document->'messages') - $2::int)
            FROM target
            WHERE users.id = target.id AND target.message IS NOT NULL
            RETURNING target.message
            "#,
        )
        .bind(id)
        .bind(position)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        match message {
            Some(Json(message)) => Ok(message),
            None if self.find_by_id(id).await?.is_some() => {
                Err(UserError::MessageNotFound { index })
            }
            None => Err(UserError::NotFound(id)),
        }
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        info!("Deleting user document: {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> UserResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}
