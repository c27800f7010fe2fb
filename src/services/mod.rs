//! Business logic services

pub mod auth;
pub mod catalog;
pub mod ledger;
pub mod members;
pub mod redis;
pub mod setup;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub ledger: ledger::LedgerService,
    pub setup: setup::SetupService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, redis: redis::RedisService) -> Self {
        let members = members::MembersService::new(repository.clone());
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config, redis),
            catalog: catalog::CatalogService::new(repository.clone()),
            ledger: ledger::LedgerService::new(repository.clone(), members.clone()),
            members,
            setup: setup::SetupService::new(repository.clone()),
            repository,
        }
    }
}
