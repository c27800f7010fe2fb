//! Borrow transactions and their lifecycle
//!
//! A borrow starts `Outstanding` and moves once to `Returned`. The copy
//! count of the book moves with it: one copy out when the borrow is opened,
//! one copy back the first time it is closed, never again after that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::Book;
use crate::error::AppResult;

/// Lifecycle state of a borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowState {
    Outstanding,
    Returned,
}

/// Borrow from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub borrowed_by: Option<i32>,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned_by: Option<i32>,
    pub returned: bool,
}

/// Outcome of a return request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Returned,
    AlreadyReturned,
}

impl Borrow {
    pub fn state(&self) -> BorrowState {
        if self.returned {
            BorrowState::Returned
        } else {
            BorrowState::Outstanding
        }
    }

    /// Close the borrow. A second call leaves every field as it was.
    pub fn close(&mut self, actor: i32, at: DateTime<Utc>) -> ReturnStatus {
        if self.returned {
            return ReturnStatus::AlreadyReturned;
        }
        self.returned = true;
        self.return_date = Some(at);
        self.returned_by = Some(actor);
        ReturnStatus::Returned
    }
}

/// Borrow about to be inserted
#[derive(Debug, Clone)]
pub struct NewBorrow {
    pub book_id: i32,
    pub member_id: i32,
    pub borrowed_by: i32,
    pub borrow_date: DateTime<Utc>,
}

impl NewBorrow {
    /// Take a copy of `book` for `member_id`. Nothing changes when the
    /// book has no copy left.
    pub fn open(book: &mut Book, member_id: i32, actor: i32, at: DateTime<Utc>) -> AppResult<Self> {
        book.take_copy()?;
        Ok(Self {
            book_id: book.id,
            member_id,
            borrowed_by: actor,
            borrow_date: at,
        })
    }
}

/// Borrow joined with the book and member it links
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_isbn: String,
    pub member_id: i32,
    pub member_name: String,
    pub member_email: String,
    /// Account linked to the member, used for ownership checks
    pub member_user_id: Option<i32>,
    pub borrowed_by: Option<i32>,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned_by: Option<i32>,
    pub returned: bool,
}

/// Log filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowFilter {
    #[default]
    All,
    Returned,
    Unreturned,
}

impl BorrowFilter {
    /// Unknown values fall back to `All`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("returned") => BorrowFilter::Returned,
            Some("unreturned") | Some("outstanding") => BorrowFilter::Unreturned,
            _ => BorrowFilter::All,
        }
    }

    /// Value for the `returned` column, `None` meaning no restriction
    pub fn returned(&self) -> Option<bool> {
        match self {
            BorrowFilter::All => None,
            BorrowFilter::Returned => Some(true),
            BorrowFilter::Unreturned => Some(false),
        }
    }
}

/// Log query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BorrowLogQuery {
    /// all, returned or unreturned
    pub filter: Option<String>,
}

/// Borrow form submitted from the catalog page
#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogBorrowRequest {
    pub book_id: i32,
    pub member_id: i32,
}
