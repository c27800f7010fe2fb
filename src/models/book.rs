//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};

static ISBN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{13}$").expect("valid ISBN regex"));

/// Strip the separators people type into ISBNs
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| !matches!(c, '-' | ' ')).collect()
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if ISBN_RE.is_match(&normalize_isbn(isbn)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("isbn");
        err.message = Some("ISBN must be 13 digits".into());
        Err(err)
    }
}

/// Book from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub available_copies: i32,
    pub added_by: Option<i32>,
    pub added_date: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Hand out one copy. Fails without touching the count when none is left.
    pub fn take_copy(&mut self) -> AppResult<()> {
        if !self.is_available() {
            return Err(AppError::Unavailable(format!(
                "Book \"{}\" is not available for borrowing.",
                self.title
            )));
        }
        self.available_copies -= 1;
        Ok(())
    }

    /// Put one copy back on the shelf
    pub fn restore_copy(&mut self) -> AppResult<()> {
        self.available_copies = self.available_copies.checked_add(1).ok_or_else(|| {
            AppError::Validation(format!("Book \"{}\" cannot hold more copies.", self.title))
        })?;
        Ok(())
    }
}

/// Book fields submitted by librarians (create and edit)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title is required (200 characters max)"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author is required (200 characters max)"))]
    pub author: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    #[validate(range(
        min = 0,
        max = 1_000_000,
        message = "Available copies must be between 0 and 1000000"
    ))]
    #[serde(default)]
    pub available_copies: i32,
}

impl BookInput {
    /// Copy with the ISBN reduced to its 13 digits
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            isbn: normalize_isbn(&self.isbn),
            available_copies: self.available_copies,
        }
    }
}

/// Catalog query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive match on title, author or ISBN
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl BookQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 200)
    }
}

/// Delete confirmation data
#[derive(Debug, Serialize, ToSchema)]
pub struct BookDeletePreview {
    pub book: Book,
    /// Outstanding borrows removed along with the book
    pub outstanding_borrows: i64,
}
