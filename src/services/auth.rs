use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::authentication::{compute_password_hash, validate_credentials, AuthError};
use crate::domain::{FullName, NewUser, User, UserEmail, UserRole};
use crate::repositories::UserRepository;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
}

pub fn validate_password(password: &Secret<String>) -> Result<(), String> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        Err(format!(
            "The password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ))
    } else {
        Ok(())
    }
}

fn parse_full_name(full_name: Option<&str>) -> Result<Option<FullName>, AuthError> {
    match full_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => FullName::parse(name.to_string())
            .map(Some)
            .map_err(AuthError::Validation),
        None => Ok(None),
    }
}

impl AuthService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    #[tracing::instrument(name = "Register user", skip(self, password, full_name))]
    pub async fn register(
        &self,
        email: &str,
        password: Secret<String>,
        full_name: Option<&str>,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = UserEmail::parse(email.to_string()).map_err(AuthError::Validation)?;
        let full_name = parse_full_name(full_name)?;
        validate_password(&password).map_err(AuthError::Validation)?;

        if self.users.get_by_email(email.as_ref()).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = compute_password_hash(password).await?;
        let new_user = NewUser::with_role(role, email, full_name, password_hash)
            .map_err(AuthError::Validation)?;
        let user = self.users.create(&new_user).await?;
        Ok(user)
    }

    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    #[tracing::instrument(name = "Log in", skip(self, password))]
    pub async fn login(&self, email: &str, password: Secret<String>) -> Result<User, AuthError> {
        let stored = self.users.get_credentials(email).await?;
        validate_credentials(stored, password).await
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, anyhow::Error> {
        self.users.get_by_id(user_id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        self.users.get_by_email(email).await
    }

    pub fn is_admin(&self, user: &User) -> bool {
        user.is_admin()
    }

    pub fn is_tenant(&self, user: &User) -> bool {
        user.is_tenant()
    }

    pub fn can_access_department(&self, user: &User, department_id: Uuid) -> bool {
        match user.role {
            UserRole::Admin => true,
            UserRole::Tenant => user.department_id == Some(department_id),
            UserRole::Visitor => false,
        }
    }

    /// Turn an existing account into an administrator and refresh its name.
    #[tracing::instrument(name = "Promote user", skip(self))]
    pub async fn promote_to_admin(
        &self,
        email: &str,
        full_name: &str,
    ) -> Result<User, AuthError> {
        let full_name = parse_full_name(Some(full_name))?;
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AuthError::Validation(format!("No user is registered with {}", email)))?;
        let updated = self
            .users
            .set_role_and_name(
                user.id,
                UserRole::Admin,
                full_name.as_ref().map(|n| n.as_ref()),
            )
            .await?
            .ok_or_else(|| anyhow::anyhow!("The promoted user was not returned"))?;
        Ok(updated)
    }
}
