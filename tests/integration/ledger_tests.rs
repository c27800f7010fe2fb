//! Ledger and membership tests against a real PostgreSQL database
//!
//! Needs DATABASE_URL pointing at a server where test databases can be
//! created. Run with: cargo test --test ledger_tests -- --ignored

use sqlx::PgPool;

use libris_server::{
    config::{AuthConfig, BootstrapAccount, BootstrapConfig},
    error::AppError,
    models::{
        access::Actor,
        book::BookInput,
        borrow::{BorrowFilter, ReturnStatus},
        member::CreateMember,
        role::{Group, Role},
        user::{NewUser, RegisterUser},
    },
    repository::Repository,
    services::{redis::RedisService, Services},
};

async fn services(pool: PgPool) -> Services {
    let redis = RedisService::open("redis://127.0.0.1:6379").unwrap();
    let services = Services::new(Repository::new(pool), AuthConfig::default(), redis);
    services.repository.users.ensure_groups().await.unwrap();
    services
}

async fn account(services: &Services, username: &str, groups: &[Group], with_profile: bool) -> Actor {
    let new_user = NewUser {
        username: username.to_string(),
        password_hash: services.auth.hash_password("password123").unwrap(),
        first_name: username.to_string(),
        last_name: "Test".to_string(),
        email: format!("{}@library.test", username),
    };
    let (user, _) = services
        .auth
        .create_account(&new_user, groups, with_profile)
        .await
        .unwrap();
    Actor {
        user_id: user.id,
        username: user.username,
        role: services.auth.role_of(user.id).await.unwrap(),
    }
}

async fn book(services: &Services, librarian: &Actor, isbn: &str, copies: i32) -> i32 {
    let input = BookInput {
        title: "1984".to_string(),
        author: "George Orwell".to_string(),
        isbn: isbn.to_string(),
        available_copies: copies,
    };
    services.catalog.create(input, librarian.user_id).await.unwrap().id
}

async fn walk_in_member(services: &Services, name: &str) -> i32 {
    let request = CreateMember {
        name: name.to_string(),
        email: format!("{}@walk-in.test", name.to_lowercase()),
    };
    services.members.create(request).await.unwrap().id
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_borrow_then_return_restores_copies(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "978-0-451-52493-5", 4).await;
    let member_id = walk_in_member(&services, "Winston").await;

    let borrow = services.ledger.borrow(&librarian, book_id, member_id).await.unwrap();
    assert!(!borrow.returned);
    assert_eq!(borrow.book_isbn, "9780451524935");
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 3);

    let (returned, status) = services.ledger.return_borrow(&librarian, borrow.id).await.unwrap();
    assert_eq!(status, ReturnStatus::Returned);
    assert!(returned.returned);
    assert_eq!(returned.returned_by, Some(librarian.user_id));
    let return_date = returned.return_date.unwrap();
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 4);

    // Second return changes nothing
    let (again, status) = services.ledger.return_borrow(&librarian, borrow.id).await.unwrap();
    assert_eq!(status, ReturnStatus::AlreadyReturned);
    assert_eq!(again.return_date, Some(return_date));
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_borrow_without_copies_is_rejected(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "9780000000002", 0).await;
    let member_id = walk_in_member(&services, "Julia").await;

    let result = services.ledger.borrow(&librarian, book_id, member_id).await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));

    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 0);
    let logs = services.ledger.logs(&librarian, BorrowFilter::All).await.unwrap();
    assert!(logs.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_only_owner_or_librarian_can_return(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let owner = account(&services, "owner", &[Group::Member], true).await;
    let other = account(&services, "other", &[Group::Member], true).await;
    assert_eq!(owner.role, Role::Member);

    let book_id = book(&services, &librarian, "9780000000019", 2).await;
    let owner_member = services
        .repository
        .members
        .get_by_user(owner.user_id)
        .await
        .unwrap()
        .unwrap();
    let borrow = services
        .ledger
        .borrow(&librarian, book_id, owner_member.id)
        .await
        .unwrap();

    let result = services.ledger.return_borrow(&other, borrow.id).await;
    assert!(matches!(result, Err(AppError::Ownership(_))));
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 1);

    let (_, status) = services.ledger.return_borrow(&owner, borrow.id).await.unwrap();
    assert_eq!(status, ReturnStatus::Returned);
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_members_cannot_borrow_or_read_logs(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let member = account(&services, "member", &[Group::Member], true).await;
    let book_id = book(&services, &librarian, "9780000000026", 1).await;
    let member_id = walk_in_member(&services, "Parsons").await;

    let result = services.ledger.borrow(&member, book_id, member_id).await;
    assert!(matches!(result, Err(AppError::Authorization(_))));
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 1);

    let result = services.ledger.logs(&member, BorrowFilter::All).await;
    assert!(matches!(result, Err(AppError::Authorization(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_logs_filter_and_order(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "9780000000033", 3).await;
    let member_id = walk_in_member(&services, "Syme").await;

    let first = services.ledger.borrow(&librarian, book_id, member_id).await.unwrap();
    let second = services.ledger.borrow(&librarian, book_id, member_id).await.unwrap();
    services.ledger.return_borrow(&librarian, first.id).await.unwrap();

    let all = services.ledger.logs(&librarian, BorrowFilter::All).await.unwrap();
    assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![second.id, first.id]);

    let returned = services.ledger.logs(&librarian, BorrowFilter::Returned).await.unwrap();
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].id, first.id);

    let outstanding = services.ledger.logs(&librarian, BorrowFilter::Unreturned).await.unwrap();
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].id, second.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_inactive_member_cannot_borrow_from_catalog(pool: PgPool) {
    let services = services(pool.clone()).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "9780000000040", 1).await;
    let member_id = walk_in_member(&services, "Ampleforth").await;

    sqlx::query("UPDATE members SET is_active = FALSE WHERE id = $1")
        .bind(member_id)
        .execute(&pool)
        .await
        .unwrap();

    let result = services
        .ledger
        .borrow_from_catalog(&librarian, book_id, member_id)
        .await;
    assert!(matches!(result, Err(AppError::FieldValidation(_))));
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_isbn_is_a_field_error(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    book(&services, &librarian, "9780451524935", 1).await;

    let duplicate = BookInput {
        title: "Nineteen Eighty-Four".to_string(),
        author: "Orwell".to_string(),
        isbn: "978 0451 524935".to_string(),
        available_copies: 1,
    };
    let result = services.catalog.create(duplicate, librarian.user_id).await;
    match result {
        Err(AppError::FieldValidation(errors)) => {
            assert!(errors.field_errors().contains_key("isbn"));
        }
        other => panic!("expected isbn field error, got {:?}", other.map(|b| b.id)),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deleting_book_removes_its_borrows(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "9780000000057", 2).await;
    let member_id = walk_in_member(&services, "Goldstein").await;
    services.ledger.borrow(&librarian, book_id, member_id).await.unwrap();

    let preview = services.catalog.delete_preview(book_id).await.unwrap();
    assert_eq!(preview.outstanding_borrows, 1);

    services.catalog.delete(book_id).await.unwrap();
    assert!(matches!(services.catalog.get(book_id).await, Err(AppError::NotFound(_))));
    let logs = services.ledger.logs(&librarian, BorrowFilter::All).await.unwrap();
    assert!(logs.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_profile_get_or_create_is_idempotent(pool: PgPool) {
    let services = services(pool).await;
    let guest = account(&services, "walkin", &[], false).await;
    assert_eq!(guest.role, Role::Guest);

    let (first, borrows) = services.ledger.my_borrows(&guest).await.unwrap();
    assert!(borrows.is_empty());
    assert_eq!(first.user_id, Some(guest.user_id));
    assert_eq!(first.name, "walkin Test");

    let (second, _) = services.ledger.my_borrows(&guest).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(services.members.list().await.unwrap().len(), 1);

    // Having a profile is enough to act as a member
    assert_eq!(services.auth.role_of(guest.user_id).await.unwrap(), Role::Member);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_profile_email_collision_is_reported(pool: PgPool) {
    let services = services(pool).await;
    services
        .members
        .create(CreateMember {
            name: "Someone Else".to_string(),
            email: "taken@library.test".to_string(),
        })
        .await
        .unwrap();
    let guest = account(&services, "taken", &[], false).await;

    let result = services.ledger.my_borrows(&guest).await;
    assert!(matches!(result, Err(AppError::FieldValidation(_))));
    assert_eq!(services.members.list().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_register_creates_member_profile(pool: PgPool) {
    let services = services(pool).await;
    let request = RegisterUser {
        username: "reader".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.org".to_string(),
        password: "analytical".to_string(),
        password_confirm: "analytical".to_string(),
    };

    let (user, member) = services.auth.register(request).await.unwrap();
    assert_eq!(member.name, "Ada Lovelace");
    assert_eq!(member.email, "ada@example.org");
    assert_eq!(member.user_id, Some(user.id));
    assert_eq!(services.auth.role_of(user.id).await.unwrap(), Role::Member);

    let (_, user, role) = services
        .auth
        .authenticate("READER", "analytical")
        .await
        .unwrap();
    assert_eq!(user.username, "reader");
    assert_eq!(role, Role::Member);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_set_role_replaces_groups(pool: PgPool) {
    let services = services(pool).await;
    let user = account(&services, "promoted", &[Group::Member], false).await;
    assert_eq!(user.role, Role::Member);

    let (_, role) = services.auth.set_role(user.user_id, Role::Librarian).await.unwrap();
    assert_eq!(role, Role::Librarian);

    let (_, role) = services.auth.set_role(user.user_id, Role::Guest).await.unwrap();
    assert_eq!(role, Role::Guest);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_setup_is_idempotent(pool: PgPool) {
    let services = services(pool).await;
    let config = BootstrapConfig {
        librarian: Some(BootstrapAccount {
            username: "librarian".to_string(),
            password: "librarian123".to_string(),
            email: "librarian@library.com".to_string(),
            first_name: "Library".to_string(),
            last_name: "Librarian".to_string(),
        }),
        member: Some(BootstrapAccount {
            username: "member".to_string(),
            password: "member123".to_string(),
            email: "member@library.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Member".to_string(),
        }),
    };

    services.setup.run(&services.auth, &config).await.unwrap();
    services.setup.run(&services.auth, &config).await.unwrap();

    let (_, _, role) = services.auth.authenticate("librarian", "librarian123").await.unwrap();
    assert_eq!(role, Role::Librarian);
    let (_, member, role) = services.auth.authenticate("member", "member123").await.unwrap();
    assert_eq!(role, Role::Member);
    let profile = services.repository.members.get_by_user(member.id).await.unwrap();
    assert_eq!(profile.map(|m| m.name), Some("John Member".to_string()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_returns_restore_one_copy(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "9780000000064", 4).await;
    let member_id = walk_in_member(&services, "Tillotson").await;
    let borrow = services.ledger.borrow(&librarian, book_id, member_id).await.unwrap();
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 3);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let services = services.clone();
            let librarian = librarian.clone();
            tokio::spawn(async move { services.ledger.return_borrow(&librarian, borrow.id).await })
        })
        .collect();

    let mut returned = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap().1 {
            ReturnStatus::Returned => returned += 1,
            ReturnStatus::AlreadyReturned => already += 1,
        }
    }
    assert_eq!(returned, 1);
    assert_eq!(already, 7);
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_borrows_of_last_copy(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let book_id = book(&services, &librarian, "9780000000071", 1).await;
    let member_id = walk_in_member(&services, "Martin").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let services = services.clone();
            let librarian = librarian.clone();
            tokio::spawn(async move { services.ledger.borrow(&librarian, book_id, member_id).await })
        })
        .collect();

    let mut opened = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => opened += 1,
            Err(AppError::Unavailable(_)) => {}
            Err(other) => panic!("unexpected borrow failure: {}", other),
        }
    }
    assert_eq!(opened, 1);
    assert_eq!(services.catalog.get(book_id).await.unwrap().available_copies, 0);
    let logs = services.ledger.logs(&librarian, BorrowFilter::All).await.unwrap();
    assert_eq!(logs.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_return_racing_book_delete_ends_cleanly(pool: PgPool) {
    let services = services(pool).await;
    let librarian = account(&services, "librarian", &[Group::Librarian], false).await;
    let member_id = walk_in_member(&services, "Charrington").await;

    for round in 0..20 {
        let book_id = book(&services, &librarian, &format!("978{:010}", 1000 + round), 2).await;
        let borrow = services.ledger.borrow(&librarian, book_id, member_id).await.unwrap();

        let returning = {
            let services = services.clone();
            let librarian = librarian.clone();
            tokio::spawn(async move { services.ledger.return_borrow(&librarian, borrow.id).await })
        };
        let deleting = {
            let services = services.clone();
            tokio::spawn(async move { services.catalog.delete(book_id).await })
        };

        match returning.await.unwrap() {
            Ok((_, status)) => assert_eq!(status, ReturnStatus::Returned),
            Err(AppError::NotFound(_)) => {}
            Err(other) => panic!("round {}: return failed with {}", round, other),
        }
        if let Err(err) = deleting.await.unwrap() {
            panic!("round {}: delete failed with {}", round, err);
        }
        assert!(matches!(services.catalog.get(book_id).await, Err(AppError::NotFound(_))));
    }
}
