use anyhow::Context;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::backend::{BackendClient, Query};
use crate::domain::{NewUser, User, UserRole};

const TABLE: &str = "users";

#[derive(Clone)]
pub struct UserRepository {
    client: BackendClient,
}

#[derive(serde::Serialize)]
struct NewUserRow<'a> {
    email: &'a str,
    role: UserRole,
    full_name: Option<&'a str>,
    password_hash: &'a str,
    department_id: Option<Uuid>,
}

#[derive(serde::Serialize)]
struct UserUpdateRow<'a> {
    email: &'a str,
    role: UserRole,
    full_name: Option<&'a str>,
    department_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

#[derive(serde::Deserialize)]
struct CredentialsRow {
    #[serde(flatten)]
    user: User,
    password_hash: Option<String>,
}

impl UserRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(name = "Get user by id", skip(self))]
    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        self.client
            .select_one(TABLE, &Query::new().eq("id", user_id))
            .await
            .context("Failed to fetch a user by id")
    }

    #[tracing::instrument(name = "Get user by email", skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let email = email.trim().to_lowercase();
        self.client
            .select_one(TABLE, &Query::new().eq("email", email))
            .await
            .context("Failed to fetch a user by email")
    }

    /// The user together with its stored password hash, if it has one.
    #[tracing::instrument(name = "Get stored credentials", skip(self))]
    pub async fn get_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, Secret<String>)>, anyhow::Error> {
        let email = email.trim().to_lowercase();
        let row: Option<CredentialsRow> = self
            .client
            .select_one(TABLE, &Query::new().eq("email", email))
            .await
            .context("Failed to fetch stored credentials")?;
        Ok(row.and_then(|r| {
            r.password_hash
                .map(|hash| (r.user, Secret::new(hash)))
        }))
    }

    #[tracing::instrument(name = "Create user", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create(&self, new_user: &NewUser) -> Result<User, anyhow::Error> {
        let row = NewUserRow {
            email: new_user.email.as_ref(),
            role: new_user.role,
            full_name: new_user.full_name.as_ref().map(|n| n.as_ref()),
            password_hash: new_user.password_hash.expose_secret(),
            department_id: None,
        };
        self.client
            .insert(TABLE, &row)
            .await
            .context("Failed to insert a new user")
    }

    #[tracing::instrument(name = "Update user", skip(self, user), fields(user_id = %user.id))]
    pub async fn update(&self, user: &User) -> Result<Option<User>, anyhow::Error> {
        let row = UserUpdateRow {
            email: &user.email,
            role: user.role,
            full_name: user.full_name.as_deref(),
            department_id: user.department_id,
            updated_at: Utc::now(),
        };
        let rows: Vec<User> = self
            .client
            .update(TABLE, &Query::new().eq("id", user.id), &row)
            .await
            .context("Failed to update a user")?;
        Ok(rows.into_iter().next())
    }

    /// Assign a unit to a user, `None` unassigns it.
    #[tracing::instrument(name = "Set user department", skip(self))]
    pub async fn set_department(
        &self,
        user_id: Uuid,
        department_id: Option<Uuid>,
    ) -> Result<(), anyhow::Error> {
        let _: Vec<User> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", user_id),
                &serde_json::json!({
                    "department_id": department_id,
                    "updated_at": Utc::now(),
                }),
            )
            .await
            .context("Failed to set the department of a user")?;
        Ok(())
    }

    #[tracing::instrument(name = "Set user role and name", skip(self))]
    pub async fn set_role_and_name(
        &self,
        user_id: Uuid,
        role: UserRole,
        full_name: Option<&str>,
    ) -> Result<Option<User>, anyhow::Error> {
        let rows: Vec<User> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", user_id),
                &serde_json::json!({
                    "role": role,
                    "full_name": full_name,
                    "updated_at": Utc::now(),
                }),
            )
            .await
            .context("Failed to update the role of a user")?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Get tenants of a department", skip(self))]
    pub async fn get_tenants_by_department(
        &self,
        department_id: Uuid,
    ) -> Result<Vec<User>, anyhow::Error> {
        let query = Query::new()
            .eq("department_id", department_id)
            .eq("role", UserRole::Tenant);
        self.client
            .select(TABLE, &query)
            .await
            .context("Failed to fetch the tenants of a department")
    }
}
