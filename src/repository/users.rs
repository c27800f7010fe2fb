//! Users and groups repository

use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        member::{CreateMember, Member},
        role::{Group, RoleFacts},
        user::{NewUser, User},
    },
    repository::members::MembersRepository,
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create an account, its group memberships and optionally its member
    /// profile, all in one transaction
    pub async fn create(
        &self,
        user: &NewUser,
        groups: &[Group],
        profile: Option<&CreateMember>,
    ) -> AppResult<(User, Option<Member>)> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email, is_active, date_joined)
            VALUES ($1, $2, $3, $4, $5, TRUE, NOW())
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await?;

        Self::add_groups(&mut tx, created.id, groups).await?;

        let member = match profile {
            Some(profile) => Some(MembersRepository::insert(&mut tx, profile, Some(created.id)).await?),
            None => None,
        };

        tx.commit().await?;
        Ok((created, member))
    }

    /// Load what the role of a user is derived from
    pub async fn role_facts(&self, user_id: i32) -> AppResult<RoleFacts> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(ARRAY(
                    SELECT g.name::text FROM user_groups ug
                    JOIN groups g ON g.id = ug.group_id
                    WHERE ug.user_id = $1
                ), '{}') AS groups,
                EXISTS(SELECT 1 FROM members m WHERE m.user_id = $1) AS has_member_profile
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let names: Vec<String> = row.get("groups");
        let groups = names
            .iter()
            .filter_map(|name| match name.parse::<Group>() {
                Ok(group) => Some(group),
                Err(e) => {
                    tracing::warn!(user_id, "ignoring group membership: {}", e);
                    None
                }
            })
            .collect();

        Ok(RoleFacts {
            authenticated: true,
            groups,
            has_member_profile: row.get("has_member_profile"),
        })
    }

    /// Replace a user's group memberships
    pub async fn set_groups(&self, user_id: i32, groups: &[Group]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        Self::add_groups(&mut tx, user_id, groups).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn add_groups(conn: &mut PgConnection, user_id: i32, groups: &[Group]) -> AppResult<()> {
        for group in groups {
            let result = sqlx::query(
                r#"
                INSERT INTO user_groups (user_id, group_id)
                SELECT $1, id FROM groups WHERE name = $2
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(group)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                tracing::debug!(user_id, %group, "group membership unchanged");
            }
        }
        Ok(())
    }

    /// Create the well-known groups; returns how many were missing
    pub async fn ensure_groups(&self) -> AppResult<u64> {
        let mut created = 0;
        for group in Group::ALL {
            created += sqlx::query("INSERT INTO groups (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                .bind(group)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(created)
    }
}
