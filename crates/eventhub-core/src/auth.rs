//! # Authenticated Context
//!
//! The caller identity every workflow operation receives as an explicit
//! parameter. How the context is produced (bearer token, test fixture)
//! is the API layer's concern; this module only answers "may this caller
//! do that?".

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// Who is calling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        AuthContext {
            user_id: user_id.into(),
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails unless the caller has one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> CoreResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "{:?} role cannot perform this operation",
                self.role
            )))
        }
    }

    /// Fails unless the caller is an admin.
    pub fn require_admin(&self) -> CoreResult<()> {
        self.require_role(&[Role::Admin])
    }

    /// Fails unless the caller owns the resource or is an admin.
    pub fn require_owner_or_admin(&self, owner_id: &str) -> CoreResult<()> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(CoreError::forbidden("resource belongs to another user"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        let customer = AuthContext::new("u-1", Role::Customer);
        assert!(customer.require_role(&[Role::Customer]).is_ok());
        assert!(customer.require_admin().is_err());

        let admin = AuthContext::new("u-2", Role::Admin);
        assert!(admin.require_admin().is_ok());
    }

    #[test]
    fn test_owner_or_admin() {
        let owner = AuthContext::new("u-1", Role::Organizer);
        assert!(owner.require_owner_or_admin("u-1").is_ok());
        assert!(matches!(
            owner.require_owner_or_admin("u-9"),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(AuthContext::new("a", Role::Admin)
            .require_owner_or_admin("u-9")
            .is_ok());
    }
}
