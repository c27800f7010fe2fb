//! Data models for Libris

pub mod access;
pub mod book;
pub mod borrow;
pub mod member;
pub mod role;
pub mod user;

// Re-export commonly used types
pub use access::{Actor, Requirement};
pub use book::Book;
pub use borrow::{Borrow, BorrowDetails, BorrowFilter, ReturnStatus};
pub use member::Member;
pub use role::{Group, Role, RoleFacts};
pub use user::User;
