//! Access guard: role requirements and return ownership

use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;
use crate::error::{AppError, AppResult};

/// Authenticated caller with its resolved role
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Actor {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

/// What an operation demands of its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Librarian,
    Member,
}

impl Requirement {
    pub fn is_met_by(&self, role: Role) -> bool {
        match self {
            Requirement::Authenticated => true,
            Requirement::Librarian => role == Role::Librarian,
            Requirement::Member => role == Role::Member,
        }
    }
}

impl Actor {
    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn require(&self, requirement: Requirement) -> AppResult<()> {
        if requirement.is_met_by(self.role) {
            return Ok(());
        }
        tracing::debug!(
            user = %self.username,
            role = %self.role,
            ?requirement,
            "access denied"
        );
        let message = match requirement {
            Requirement::Librarian => "Librarian privileges required",
            Requirement::Member => "Member privileges required",
            Requirement::Authenticated => "Authentication required",
        };
        Err(AppError::Authorization(message.to_string()))
    }

    /// Librarians may return any borrow; anyone else only their own
    pub fn ensure_can_return(&self, member_user_id: Option<i32>) -> AppResult<()> {
        if self.is_librarian() || member_user_id == Some(self.user_id) {
            Ok(())
        } else {
            Err(AppError::Ownership(
                "You can only return your own borrowed books.".to_string(),
            ))
        }
    }
}
