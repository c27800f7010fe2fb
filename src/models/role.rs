//! Roles and group membership

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Stored group a user can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Group {
    Librarian,
    Member,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Librarian, Group::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Librarian => "Librarian",
            Group::Member => "Member",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Librarian" => Ok(Group::Librarian),
            "Member" => Ok(Group::Member),
            _ => Err(format!("Unknown group: {}", s)),
        }
    }
}

// SQLx conversion for Group (stored as the group name)
impl sqlx::Type<Postgres> for Group {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Group {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Group {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Role a caller acts under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Librarian,
    Member,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Librarian => "librarian",
            Role::Member => "member",
            Role::Guest => "guest",
        }
    }

    /// Derive the role from what is stored about a user.
    ///
    /// Librarian wins over member when both apply. An authenticated user
    /// with neither a group nor a member profile stays a guest.
    pub fn resolve(facts: &RoleFacts) -> Role {
        if !facts.authenticated {
            return Role::Guest;
        }
        if facts.groups.contains(&Group::Librarian) {
            Role::Librarian
        } else if facts.groups.contains(&Group::Member) || facts.has_member_profile {
            Role::Member
        } else {
            Role::Guest
        }
    }

    /// Landing path for this role
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Librarian => "/books",
            Role::Member => "/my-borrows",
            Role::Guest => "/login",
        }
    }

    /// Groups granted when a user is assigned this role
    pub fn groups(&self) -> &'static [Group] {
        match self {
            Role::Librarian => &[Group::Librarian],
            Role::Member => &[Group::Member],
            Role::Guest => &[],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored associations the role is derived from
#[derive(Debug, Clone, Default)]
pub struct RoleFacts {
    pub authenticated: bool,
    pub groups: Vec<Group>,
    pub has_member_profile: bool,
}

impl RoleFacts {
    pub fn anonymous() -> Self {
        Self::default()
    }
}
