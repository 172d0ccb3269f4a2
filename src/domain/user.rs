use chrono::{DateTime, Utc};
use secrecy::Secret;
use uuid::Uuid;

use crate::domain::{FullName, UserEmail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Tenant,
    /// Anonymous browsing only, never persisted.
    Visitor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Tenant => "tenant",
            UserRole::Visitor => "visitor",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub full_name: Option<String>,
    pub department_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_tenant(&self) -> bool {
        self.role == UserRole::Tenant
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

/// A user that has not been stored yet.
#[derive(Debug)]
pub struct NewUser {
    pub email: UserEmail,
    pub role: UserRole,
    pub full_name: Option<FullName>,
    pub password_hash: Secret<String>,
}

impl NewUser {
    pub fn tenant(
        email: UserEmail,
        full_name: Option<FullName>,
        password_hash: Secret<String>,
    ) -> Self {
        Self {
            email,
            role: UserRole::Tenant,
            full_name,
            password_hash,
        }
    }

    pub fn admin(
        email: UserEmail,
        full_name: Option<FullName>,
        password_hash: Secret<String>,
    ) -> Self {
        Self {
            email,
            role: UserRole::Admin,
            full_name,
            password_hash,
        }
    }

    pub fn with_role(
        role: UserRole,
        email: UserEmail,
        full_name: Option<FullName>,
        password_hash: Secret<String>,
    ) -> Result<Self, String> {
        match role {
            UserRole::Tenant => Ok(Self::tenant(email, full_name, password_hash)),
            UserRole::Admin => Ok(Self::admin(email, full_name, password_hash)),
            UserRole::Visitor => {
                Err(format!("{} is not a valid role for registration.", role))
            }
        }
    }
}
