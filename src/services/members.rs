//! Membership service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        member::{CreateMember, Member},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All members, ordered by name
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        self.repository.members.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    /// Create a member not linked to any account
    pub async fn create(&self, request: CreateMember) -> AppResult<Member> {
        request.validate()?;
        if self.repository.members.email_exists(request.email.trim()).await? {
            return Err(AppError::field(
                "email",
                "unique",
                "Member with this Email already exists.",
            ));
        }
        let member = self.repository.members.create(&request, None).await?;
        tracing::info!(member_id = member.id, "member created");
        Ok(member)
    }

    /// Profile linked to `user`, created from the account defaults on first use
    pub async fn get_or_create_for_user(&self, user: &User) -> AppResult<Member> {
        if let Some(member) = self.repository.members.get_by_user(user.id).await? {
            return Ok(member);
        }

        let defaults = CreateMember::for_user(user);
        if self.repository.members.email_exists(&defaults.email).await? {
            return Err(AppError::field(
                "email",
                "unique",
                format!(
                    "Member with this Email already exists: {}. Ask a librarian to link your profile.",
                    defaults.email
                ),
            ));
        }

        let (member, created) = self
            .repository
            .members
            .get_or_create_for_user(user.id, &defaults)
            .await?;
        if created {
            tracing::info!(user_id = user.id, member_id = member.id, "member profile created");
        }
        Ok(member)
    }
}
