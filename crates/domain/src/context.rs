//! Per-request caller identity.

use common::UserId;
use serde::{Deserialize, Serialize};
use store::Order;

use crate::error::DomainError;

/// Role carried by a verified session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Identity of the caller, built once per request from a verified token and
/// passed explicitly into every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: UserId,
    pub role: Role,
    pub email: String,
}

impl RequestContext {
    pub fn new(user_id: UserId, role: Role, email: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            email: email.into(),
        }
    }

    /// Convenience constructor for a shopper.
    pub fn user(user_id: UserId, email: impl Into<String>) -> Self {
        Self::new(user_id, Role::User, email)
    }

    /// Convenience constructor for an administrator.
    pub fn admin(user_id: UserId, email: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin, email)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::Forbidden("Admins only".to_string()))
        }
    }

    /// Fails with `Forbidden` unless the caller owns the order.
    ///
    /// Administrators get no exemption here: payment transitions are
    /// owner-only.
    pub fn require_owner(&self, order: &Order) -> Result<(), DomainError> {
        if order.is_owned_by(self.user_id) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "Not authorized to update this order".to_string(),
            ))
        }
    }

    /// Returns true if the caller may read the order.
    pub fn can_view(&self, order: &Order) -> bool {
        self.is_admin() || order.is_owned_by(self.user_id)
    }
}
