//! Catalog service: book records and their copy counts

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookDeletePreview, BookInput, BookQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books, ordered by title
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog
    pub async fn create(&self, input: BookInput, added_by: i32) -> AppResult<Book> {
        let input = self.checked(input, None).await?;
        let book = self.repository.books.create(&input, added_by).await?;
        tracing::info!(book_id = book.id, isbn = %book.isbn, added_by, "book added");
        Ok(book)
    }

    /// Replace the editable fields of a book
    pub async fn update(&self, id: i32, input: BookInput) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await?;
        let input = self.checked(input, Some(id)).await?;
        let book = self.repository.books.update(id, &input).await?;
        tracing::info!(book_id = id, copies = book.available_copies, "book updated");
        Ok(book)
    }

    /// What a delete would remove
    pub async fn delete_preview(&self, id: i32) -> AppResult<BookDeletePreview> {
        let book = self.repository.books.get_by_id(id).await?;
        let outstanding_borrows = self.repository.books.count_outstanding(id).await?;
        Ok(BookDeletePreview {
            book,
            outstanding_borrows,
        })
    }

    /// Delete a book. Its borrow records go with it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let outstanding = self.repository.books.count_outstanding(id).await?;
        self.repository.books.delete(id).await?;
        if outstanding > 0 {
            tracing::warn!(book_id = id, outstanding, "book deleted with outstanding borrows");
        } else {
            tracing::info!(book_id = id, "book deleted");
        }
        Ok(())
    }

    /// Validate, normalize and check ISBN uniqueness
    async fn checked(&self, input: BookInput, exclude_id: Option<i32>) -> AppResult<BookInput> {
        input.validate()?;
        let input = input.normalized();
        if input.title.is_empty() || input.author.is_empty() {
            return Err(AppError::Validation("Title and author are required".to_string()));
        }
        if self.repository.books.isbn_exists(&input.isbn, exclude_id).await? {
            return Err(AppError::field(
                "isbn",
                "unique",
                "Book with this Isbn already exists.",
            ));
        }
        Ok(input)
    }
}
