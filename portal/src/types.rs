//! Shared identifiers, the role set, and the vocabulary used by the access policy.
//!
//! # Roles
//!
//! [`Profile`] is a closed set. Its string forms are the values stored in the `users.profile`
//! column and carried in sessions:
//!
//! - `admin_global`: full control over the directory and the slideshow
//! - `diseno`: design team, manages the slideshow
//! - `usuario`: a standard employee account
//! - `invitado`: a guest account (`guest` is accepted on input)
//!
//! # Policy vocabulary
//!
//! Every decoded action maps to a ([`Resource`], [`Operation`]) pair, which is what
//! [`crate::auth::policy::authorize`] decides on.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub type UserId = i64;
pub type EmployeeId = i64;
pub type SlideId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Profile {
    AdminGlobal,
    Diseno,
    Usuario,
    #[serde(alias = "guest")]
    Invitado,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::AdminGlobal => "admin_global",
            Profile::Diseno => "diseno",
            Profile::Usuario => "usuario",
            Profile::Invitado => "invitado",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Operations an action can perform. *-Own operations act on the caller's own account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// login, logout and check_session: reachable without a session
    Session,
    Read,
    Create,
    Update,
    Delete,
    ReadOwn,
    UpdateOwn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Account,
    Directory,
    Slideshow,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Session => write!(f, "Access"),
            Operation::Read | Operation::ReadOwn => write!(f, "Read"),
            Operation::Create => write!(f, "Create"),
            Operation::Update | Operation::UpdateOwn => write!(f, "Update"),
            Operation::Delete => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Account => write!(f, "account"),
            Resource::Directory => write!(f, "directory"),
            Resource::Slideshow => write!(f, "slideshow"),
        }
    }
}
