//! Members repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::member::{CreateMember, Member},
};

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Get the profile linked to a user account
    pub async fn get_by_user(&self, user_id: i32) -> AppResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    /// List all members ordered by name
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(members)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a member, optionally linked to an account
    pub async fn create(&self, member: &CreateMember, user_id: Option<i32>) -> AppResult<Member> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, member, user_id).await
    }

    /// Insert on an existing connection, so callers can share a transaction
    pub async fn insert(
        conn: &mut PgConnection,
        member: &CreateMember,
        user_id: Option<i32>,
    ) -> AppResult<Member> {
        let created = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (user_id, name, email, joined_date, is_active)
            VALUES ($1, $2, $3, CURRENT_DATE, TRUE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(member.name.trim())
        .bind(member.email.trim())
        .fetch_one(conn)
        .await?;
        Ok(created)
    }

    /// Return the profile linked to `user_id`, creating it from `defaults`
    /// when missing. The boolean tells whether a row was inserted.
    pub async fn get_or_create_for_user(
        &self,
        user_id: i32,
        defaults: &CreateMember,
    ) -> AppResult<(Member, bool)> {
        // Concurrent first visits race on members_user_id_key; the loser reads
        let inserted = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (user_id, name, email, joined_date, is_active)
            VALUES ($1, $2, $3, CURRENT_DATE, TRUE)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(defaults.name.trim())
        .bind(defaults.email.trim())
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(member) => Ok((member, true)),
            None => {
                let member = self.get_by_user(user_id).await?.ok_or_else(|| {
                    AppError::Internal(format!("Member profile for user {} vanished", user_id))
                })?;
                Ok((member, false))
            }
        }
    }
}
