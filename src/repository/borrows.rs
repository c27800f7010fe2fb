//! Borrow ledger repository
//!
//! Each transition runs in one transaction holding a row lock, so the copy
//! count and the borrow record always move together.

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        borrow::{Borrow, BorrowDetails, BorrowFilter, NewBorrow, ReturnStatus},
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT br.id, br.book_id, b.title AS book_title, b.isbn AS book_isbn,
           br.member_id, m.name AS member_name, m.email AS member_email,
           m.user_id AS member_user_id,
           br.borrowed_by, br.borrow_date, br.return_date, br.returned_by, br.returned
    FROM borrows br
    JOIN books b ON b.id = br.book_id
    JOIN members m ON m.id = br.member_id
"#;

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow with book and member details
    pub async fn get_details(&self, id: i32) -> AppResult<BorrowDetails> {
        sqlx::query_as::<_, BorrowDetails>(&format!("{} WHERE br.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))
    }

    /// List borrows, most recent first
    pub async fn list(&self, filter: BorrowFilter) -> AppResult<Vec<BorrowDetails>> {
        let borrows = sqlx::query_as::<_, BorrowDetails>(&format!(
            "{} WHERE ($1::boolean IS NULL OR br.returned = $1) ORDER BY br.borrow_date DESC, br.id DESC",
            DETAILS_SELECT
        ))
        .bind(filter.returned())
        .fetch_all(&self.pool)
        .await?;
        Ok(borrows)
    }

    /// List one member's borrows, most recent first
    pub async fn list_for_member(&self, member_id: i32) -> AppResult<Vec<BorrowDetails>> {
        let borrows = sqlx::query_as::<_, BorrowDetails>(&format!(
            "{} WHERE br.member_id = $1 ORDER BY br.borrow_date DESC, br.id DESC",
            DETAILS_SELECT
        ))
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(borrows)
    }

    /// Open a borrow: take one copy of the book and record who took it.
    /// Rejected without any write when no copy is left.
    pub async fn open(&self, book_id: i32, member_id: i32, actor: i32) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let mut book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let member_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE id = $1)")
                .bind(member_id)
                .fetch_one(&mut *tx)
                .await?;
        if !member_exists {
            return Err(AppError::NotFound(format!("Member with id {} not found", member_id)));
        }

        // Dropping tx on the error path rolls back
        let new_borrow = NewBorrow::open(&mut book, member_id, actor, Utc::now())?;

        sqlx::query("UPDATE books SET available_copies = $2 WHERE id = $1")
            .bind(book.id)
            .bind(book.available_copies)
            .execute(&mut *tx)
            .await?;

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (book_id, member_id, borrowed_by, borrow_date, returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(new_borrow.book_id)
        .bind(new_borrow.member_id)
        .bind(new_borrow.borrowed_by)
        .bind(new_borrow.borrow_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            borrow_id = borrow.id,
            book_id,
            member_id,
            remaining = book.available_copies,
            "borrow opened"
        );
        Ok(borrow)
    }

    /// Close a borrow and put the copy back. A borrow already returned is
    /// left untouched and reported as such.
    ///
    /// Locks the book before the borrow, the same order a book delete
    /// takes when it cascades.
    pub async fn close(&self, borrow_id: i32, actor: i32) -> AppResult<(Borrow, ReturnStatus)> {
        let not_found = || AppError::NotFound(format!("Borrow with id {} not found", borrow_id));
        let mut tx = self.pool.begin().await?;

        let book_id: i32 = sqlx::query_scalar("SELECT book_id FROM borrows WHERE id = $1")
            .bind(borrow_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found)?;

        // Gone when a delete of the book committed first
        let mut book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(not_found)?;

        let mut borrow =
            sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1 FOR UPDATE")
                .bind(borrow_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(not_found)?;

        let status = borrow.close(actor, Utc::now());
        if status == ReturnStatus::AlreadyReturned {
            tx.rollback().await?;
            tracing::info!(borrow_id, "return ignored, already returned");
            return Ok((borrow, status));
        }
        book.restore_copy()?;

        sqlx::query(
            "UPDATE borrows SET returned = TRUE, return_date = $2, returned_by = $3 WHERE id = $1",
        )
        .bind(borrow.id)
        .bind(borrow.return_date)
        .bind(borrow.returned_by)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available_copies = $2 WHERE id = $1")
            .bind(book.id)
            .bind(book.available_copies)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(borrow_id, book_id, returned_by = actor, "borrow returned");
        Ok((borrow, status))
    }
}
