use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
    Provider,
}

impl Role {
    /// Resolves the loosely typed role claim handed out by the identity
    /// service. Anything that is not an admin or provider is a customer.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("ADMIN") => Role::Admin,
            Some("PROVIDER") => Role::Provider,
            _ => Role::Customer,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("SUSPENDED") => UserStatus::Suspended,
            _ => UserStatus::Active,
        }
    }
}

/// The authenticated caller, as vouched for by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub status: UserStatus,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            status: UserStatus::Active,
        }
    }

    pub fn customer(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn provider(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Provider)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_suspended(&self) -> bool {
        self.status == UserStatus::Suspended
    }
}
