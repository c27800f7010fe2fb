//! Authentication, registration and role resolution

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        access::Actor,
        member::{CreateMember, Member},
        role::{Group, Role, RoleFacts},
        user::{NewUser, RegisterUser, User, UserClaims},
    },
    repository::Repository,
    services::redis::RedisService,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    redis: RedisService,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig, redis: RedisService) -> Self {
        Self { repository, config, redis }
    }

    /// Secret used to sign and verify tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }

    /// Register a new account in group Member with its member profile
    pub async fn register(&self, request: RegisterUser) -> AppResult<(User, Member)> {
        request.validate()?;

        let username = request.username.trim().to_string();
        if self.repository.users.username_exists(&username).await? {
            return Err(AppError::field(
                "username",
                "unique",
                "A user with that username already exists.",
            ));
        }
        let email = request.email.trim().to_string();
        if self.repository.members.email_exists(&email).await? {
            return Err(AppError::field(
                "email",
                "unique",
                "Member with this Email already exists.",
            ));
        }

        let new_user = NewUser {
            username,
            password_hash: self.hash_password(&request.password)?,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email,
        };
        let (user, member) = self.create_account(&new_user, &[Group::Member], true).await?;
        let member = member
            .ok_or_else(|| AppError::Internal("Member profile was not created".to_string()))?;
        Ok((user, member))
    }

    /// Create an account with groups and, when asked, its default profile
    pub async fn create_account(
        &self,
        new_user: &NewUser,
        groups: &[Group],
        with_profile: bool,
    ) -> AppResult<(User, Option<Member>)> {
        let profile = with_profile.then(|| {
            CreateMember::defaults(
                &new_user.username,
                &new_user.first_name,
                &new_user.last_name,
                &new_user.email,
            )
        });

        let (user, member) = self
            .repository
            .users
            .create(new_user, groups, profile.as_ref())
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, ?groups, "account created");
        Ok((user, member))
    }

    /// Authenticate by username and password and issue a token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User, Role)> {
        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !user.is_active || !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let claims = UserClaims::new(&user, self.config.jwt_expiration_hours);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        let role = self.role_of(user.id).await?;
        tracing::info!(user_id = user.id, %role, "user logged in");
        Ok((token, user, role))
    }

    /// Revoke the token carrying these claims
    pub async fn logout(&self, claims: &UserClaims) -> AppResult<()> {
        self.redis.revoke_token(&claims.jti, claims.remaining_seconds()).await?;
        tracing::info!(user_id = claims.user_id, "user logged out");
        Ok(())
    }

    /// Turn verified claims into the acting user with its current role
    pub async fn actor_for(&self, claims: &UserClaims) -> AppResult<Actor> {
        if self.redis.is_token_revoked(&claims.jti).await? {
            return Err(AppError::Authentication("Session has ended".to_string()));
        }

        let user = self
            .repository
            .users
            .get_by_id(claims.user_id)
            .await
            .map_err(unknown_user)?;
        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        Ok(Actor {
            user_id: user.id,
            username: user.username,
            role: self.role_of(claims.user_id).await?,
        })
    }

    /// Resolve the role of an authenticated user
    pub async fn role_of(&self, user_id: i32) -> AppResult<Role> {
        let facts: RoleFacts = self.repository.users.role_facts(user_id).await?;
        Ok(Role::resolve(&facts))
    }

    /// Assign a role by replacing the user's groups
    pub async fn set_role(&self, user_id: i32, role: Role) -> AppResult<(User, Role)> {
        let user = self.repository.users.get_by_id(user_id).await?;
        self.repository.users.set_groups(user_id, role.groups()).await?;

        let resolved = self.role_of(user_id).await?;
        tracing::info!(user_id, requested = %role, %resolved, "role updated");
        Ok((user, resolved))
    }

    pub async fn get_user(&self, user_id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

/// A token for a deleted account is an authentication failure; anything
/// else the lookup hit is passed through
fn unknown_user(err: AppError) -> AppError {
    match err {
        AppError::NotFound(_) => AppError::Authentication("Unknown user".to_string()),
        other => other,
    }
}
