use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::UserRole;

pub struct TypedSession(Session);

impl TypedSession {
    const USER_ID_KEY: &'static str = "user_id";
    const USER_ROLE_KEY: &'static str = "user_role";

    pub fn renew(&self) {
        self.0.renew();
    }

    pub fn insert_user(
        &self,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<(), serde_json::Error> {
        self.0.insert(Self::USER_ID_KEY, user_id)?;
        self.0.insert(Self::USER_ROLE_KEY, role)
    }

    pub fn get_user_id(&self) -> Result<Option<Uuid>, serde_json::Error> {
        self.0.get(Self::USER_ID_KEY)
    }

    /// Anonymous sessions are visitors.
    pub fn get_user_role(&self) -> Result<UserRole, serde_json::Error> {
        Ok(self
            .0
            .get(Self::USER_ROLE_KEY)?
            .unwrap_or(UserRole::Visitor))
    }

    pub fn log_out(self) {
        self.0.purge()
    }
}

impl FromRequest for TypedSession {
    type Error = <Session as FromRequest>::Error;
    // No I/O involved, the session is ready right away.
    type Future = Ready<Result<TypedSession, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(TypedSession(req.get_session())))
    }
}
