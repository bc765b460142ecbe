//! User row model. Only the fields the workflow reads are selected.

use sqlx::FromRow;
use tracker_core::issue::User;
use tracker_core::roles::Role;
use tracker_core::store::StorageError;
use tracker_core::types::DbId;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|err| StorageError::Backend(format!("user {}: {err}", row.id)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
        })
    }
}
