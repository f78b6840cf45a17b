//! Access policy shared by every resource handler.
//!
//! Rules, applied in order:
//!
//! 1. Session actions (login, logout, check_session) and slideshow reads are open to everyone.
//!    Directory reads follow [`DirectoryReadAccess`].
//! 2. Everything else needs a session (401 otherwise).
//! 3. Own-account actions are open to any session holder.
//! 4. Directory writes need `admin_global` (403 otherwise).
//! 5. Slideshow writes need `admin_global` or `diseno` (403 otherwise).
//!
//! Unrecognized action names never reach the policy; decoding rejects them with 405.

use crate::{
    auth::session::SessionData,
    config::{AccessConfig, DirectoryReadAccess},
    errors::{Error, Result},
    types::{Operation, Profile, Resource},
};

pub const DIRECTORY_EDITORS: &[Profile] = &[Profile::AdminGlobal];
pub const SLIDESHOW_EDITORS: &[Profile] = &[Profile::AdminGlobal, Profile::Diseno];
const NON_GUESTS: &[Profile] = &[Profile::AdminGlobal, Profile::Diseno, Profile::Usuario];
const NOBODY: &[Profile] = &[];

#[derive(Debug)]
pub enum Decision {
    Allow,
    /// The error carries both the reason and the HTTP code
    Deny(Error),
}

impl Decision {
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(err) => Err(err),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

pub fn authorize(session: Option<&SessionData>, resource: Resource, operation: Operation, access: &AccessConfig) -> Decision {
    match (resource, operation) {
        (_, Operation::Session) | (Resource::Slideshow, Operation::Read) => return Decision::Allow,
        (Resource::Directory, Operation::Read) if access.directory_read == DirectoryReadAccess::Public => {
            return Decision::Allow;
        }
        _ => {}
    }

    let Some(session) = session else {
        return Decision::Deny(Error::Unauthenticated {
            message: Some("Authentication required".to_string()),
        });
    };

    let allowed = match (resource, operation) {
        (_, Operation::ReadOwn | Operation::UpdateOwn) => return Decision::Allow,
        (Resource::Directory, Operation::Read) => match access.directory_read {
            DirectoryReadAccess::NonGuest => NON_GUESTS,
            DirectoryReadAccess::Public | DirectoryReadAccess::Authenticated => return Decision::Allow,
        },
        (Resource::Directory, _) => DIRECTORY_EDITORS,
        (Resource::Slideshow, _) => SLIDESHOW_EDITORS,
        // Account resources only expose session and own-account operations
        (Resource::Account, _) => NOBODY,
    };

    if allowed.contains(&session.profile) {
        Decision::Allow
    } else {
        Decision::Deny(Error::InsufficientPermissions {
            action: operation,
            resource,
            allowed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn session(profile: Profile) -> SessionData {
        SessionData {
            user_id: 1,
            user_name: "Test".to_string(),
            profile,
        }
    }

    fn status(decision: Decision) -> StatusCode {
        match decision {
            Decision::Allow => StatusCode::OK,
            Decision::Deny(err) => err.status_code(),
        }
    }

    fn access(directory_read: DirectoryReadAccess) -> AccessConfig {
        AccessConfig {
            directory_read,
            ..Default::default()
        }
    }

    #[test]
    fn test_public_actions_need_no_session() {
        let config = AccessConfig::default();
        assert!(authorize(None, Resource::Account, Operation::Session, &config).is_allowed());
        assert!(authorize(None, Resource::Slideshow, Operation::Read, &config).is_allowed());
        assert!(authorize(None, Resource::Directory, Operation::Read, &config).is_allowed());
    }

    #[test]
    fn test_writes_without_session_are_unauthenticated() {
        let config = AccessConfig::default();
        for resource in [Resource::Directory, Resource::Slideshow] {
            for op in [Operation::Create, Operation::Update, Operation::Delete] {
                assert_eq!(status(authorize(None, resource, op, &config)), StatusCode::UNAUTHORIZED);
            }
        }
        assert_eq!(
            status(authorize(None, Resource::Account, Operation::ReadOwn, &config)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_write_role_matrix() {
        let config = AccessConfig::default();
        let cases = [
            (Profile::AdminGlobal, Resource::Directory, StatusCode::OK),
            (Profile::Diseno, Resource::Directory, StatusCode::FORBIDDEN),
            (Profile::Usuario, Resource::Directory, StatusCode::FORBIDDEN),
            (Profile::Invitado, Resource::Directory, StatusCode::FORBIDDEN),
            (Profile::AdminGlobal, Resource::Slideshow, StatusCode::OK),
            (Profile::Diseno, Resource::Slideshow, StatusCode::OK),
            (Profile::Usuario, Resource::Slideshow, StatusCode::FORBIDDEN),
            (Profile::Invitado, Resource::Slideshow, StatusCode::FORBIDDEN),
        ];
        for (profile, resource, expected) in cases {
            for op in [Operation::Create, Operation::Update, Operation::Delete] {
                let caller = session(profile);
                assert_eq!(
                    status(authorize(Some(&caller), resource, op, &config)),
                    expected,
                    "{profile} {op} {resource}"
                );
            }
        }
    }

    #[test]
    fn test_own_account_open_to_every_profile() {
        let config = AccessConfig::default();
        for profile in [Profile::AdminGlobal, Profile::Diseno, Profile::Usuario, Profile::Invitado] {
            let caller = session(profile);
            assert!(authorize(Some(&caller), Resource::Account, Operation::ReadOwn, &config).is_allowed());
            assert!(authorize(Some(&caller), Resource::Account, Operation::UpdateOwn, &config).is_allowed());
        }
    }

    #[test]
    fn test_directory_read_modes() {
        let guest = session(Profile::Invitado);
        let employee = session(Profile::Usuario);

        let authenticated = access(DirectoryReadAccess::Authenticated);
        assert_eq!(
            status(authorize(None, Resource::Directory, Operation::Read, &authenticated)),
            StatusCode::UNAUTHORIZED
        );
        assert!(authorize(Some(&guest), Resource::Directory, Operation::Read, &authenticated).is_allowed());

        let non_guest = access(DirectoryReadAccess::NonGuest);
        assert_eq!(
            status(authorize(None, Resource::Directory, Operation::Read, &non_guest)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(authorize(Some(&guest), Resource::Directory, Operation::Read, &non_guest)),
            StatusCode::FORBIDDEN
        );
        assert!(authorize(Some(&employee), Resource::Directory, Operation::Read, &non_guest).is_allowed());
    }
}
