//! Closed set of user roles.
//!
//! The string forms must match the `role` check constraint on the `users`
//! table and the `role` claim issued in access tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_DEVELOPER: &str = "Developer";
pub const ROLE_USER: &str = "User";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Developer,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Developer => ROLE_DEVELOPER,
            Role::User => ROLE_USER,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_DEVELOPER => Ok(Role::Developer),
            ROLE_USER => Ok(Role::User),
            other => Err(CoreError::Validation(format!(
                "Unknown role '{other}'. Must be one of: {ROLE_ADMIN}, {ROLE_DEVELOPER}, {ROLE_USER}"
            ))),
        }
    }
}
