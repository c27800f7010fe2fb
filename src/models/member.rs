//! Member (library patron) model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::user::User;

/// Member profile from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    /// Linked login account, if any
    pub user_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub joined_date: NaiveDate,
    pub is_active: bool,
}

/// Create member request (librarian form, or derived from an account)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(length(min = 1, max = 200, message = "Name is required (200 characters max)"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

impl CreateMember {
    /// Profile defaults: name is "first last" or the username, email is
    /// the account email or a placeholder derived from the username
    pub fn defaults(username: &str, first_name: &str, last_name: &str, email: &str) -> Self {
        let full = format!("{} {}", first_name.trim(), last_name.trim());
        let name = match full.trim() {
            "" => username.to_string(),
            full => full.to_string(),
        };
        let email = match email.trim() {
            "" => format!("{}@example.com", username),
            email => email.to_string(),
        };
        Self { name, email }
    }

    /// Profile defaults for an account that has none yet
    pub fn for_user(user: &User) -> Self {
        Self::defaults(&user.username, &user.first_name, &user.last_name, &user.email)
    }
}
