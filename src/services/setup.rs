//! Startup bootstrap of groups and default accounts

use crate::{
    config::{BootstrapAccount, BootstrapConfig},
    error::AppResult,
    models::{role::Group, user::NewUser},
    repository::Repository,
    services::auth::AuthService,
};

#[derive(Clone)]
pub struct SetupService {
    repository: Repository,
}

impl SetupService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Ensure the well-known groups and the configured accounts exist.
    /// Safe to run on every start; existing accounts are left alone.
    pub async fn run(&self, auth: &AuthService, config: &BootstrapConfig) -> AppResult<()> {
        let created = self.repository.users.ensure_groups().await?;
        if created > 0 {
            tracing::info!(created, "default groups created");
        }

        if let Some(account) = &config.librarian {
            self.ensure_account(auth, account, Group::Librarian, false).await?;
        }
        if let Some(account) = &config.member {
            self.ensure_account(auth, account, Group::Member, true).await?;
        }
        Ok(())
    }

    async fn ensure_account(
        &self,
        auth: &AuthService,
        account: &BootstrapAccount,
        group: Group,
        with_profile: bool,
    ) -> AppResult<()> {
        if self.repository.users.username_exists(&account.username).await? {
            tracing::debug!(username = %account.username, "bootstrap account already exists");
            return Ok(());
        }

        let new_user = NewUser {
            username: account.username.clone(),
            password_hash: auth.hash_password(&account.password)?,
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
        };
        auth.create_account(&new_user, &[group], with_profile).await?;
        tracing::info!(username = %account.username, %group, "bootstrap account created");
        Ok(())
    }
}
