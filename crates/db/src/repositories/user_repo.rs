//! Repository for the `users` table (read-only here).

use sqlx::PgPool;
use tracker_core::types::DbId;

use crate::models::user::UserRow;

const COLUMNS: &str = "id, name, email, role";

/// Provides user lookups for assignment and audit snapshots.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
