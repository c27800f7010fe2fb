//! Borrow ledger: borrow and return books, browse the log

use crate::{
    error::{AppError, AppResult},
    models::{
        access::{Actor, Requirement},
        borrow::{BorrowDetails, BorrowFilter, ReturnStatus},
        member::Member,
    },
    repository::Repository,
    services::members::MembersService,
};

#[derive(Clone)]
pub struct LedgerService {
    repository: Repository,
    members: MembersService,
}

impl LedgerService {
    pub fn new(repository: Repository, members: MembersService) -> Self {
        Self { repository, members }
    }

    /// Lend one copy of a book to a member
    pub async fn borrow(&self, actor: &Actor, book_id: i32, member_id: i32) -> AppResult<BorrowDetails> {
        actor.require(Requirement::Librarian)?;
        let borrow = self
            .repository
            .borrows
            .open(book_id, member_id, actor.user_id)
            .await?;
        self.repository.borrows.get_details(borrow.id).await
    }

    /// Borrow submitted from the catalog page; the member must be active
    pub async fn borrow_from_catalog(
        &self,
        actor: &Actor,
        book_id: i32,
        member_id: i32,
    ) -> AppResult<BorrowDetails> {
        actor.require(Requirement::Librarian)?;
        let member = self.repository.members.get_by_id(member_id).await?;
        if !member.is_active {
            return Err(AppError::field(
                "member_id",
                "inactive",
                format!("Member {} is not active.", member.name),
            ));
        }
        self.borrow(actor, book_id, member_id).await
    }

    /// Return a borrow. Returning twice is reported, not applied.
    pub async fn return_borrow(
        &self,
        actor: &Actor,
        borrow_id: i32,
    ) -> AppResult<(BorrowDetails, ReturnStatus)> {
        let details = self.repository.borrows.get_details(borrow_id).await?;
        actor.ensure_can_return(details.member_user_id)?;

        let (_, status) = self.repository.borrows.close(borrow_id, actor.user_id).await?;
        if status == ReturnStatus::AlreadyReturned {
            return Ok((details, status));
        }
        let details = self.repository.borrows.get_details(borrow_id).await?;
        Ok((details, status))
    }

    /// Borrow log, newest first
    pub async fn logs(&self, actor: &Actor, filter: BorrowFilter) -> AppResult<Vec<BorrowDetails>> {
        actor.require(Requirement::Librarian)?;
        self.repository.borrows.list(filter).await
    }

    /// The caller's member profile and its borrows
    pub async fn my_borrows(&self, actor: &Actor) -> AppResult<(Member, Vec<BorrowDetails>)> {
        let user = self.repository.users.get_by_id(actor.user_id).await?;
        let member = self.members.get_or_create_for_user(&user).await?;
        let borrows = self.repository.borrows.list_for_member(member.id).await?;
        Ok((member, borrows))
    }
}
