mod get;
mod post;

pub use get::login_form;
pub use post::login;

use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;

use crate::startup::HmacSecret;

fn mac(next: &str, secret: &HmacSecret) -> Result<Hmac<sha2::Sha256>, anyhow::Error> {
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.0.expose_secret().as_bytes())?;
    mac.update(format!("next={}", urlencoding::Encoded::new(next)).as_bytes());
    Ok(mac)
}

/// Only same-site paths are followed after a login.
fn is_local_path(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

/// The login form URL carrying `next` and its tag.
pub fn login_url_with_next(next: &str, secret: &HmacSecret) -> Result<String, anyhow::Error> {
    let tag = hex::encode(mac(next, secret)?.finalize().into_bytes());
    Ok(format!(
        "/login?next={}&tag={}",
        urlencoding::Encoded::new(next),
        tag
    ))
}

pub fn verify_next(next: &str, tag: &str, secret: &HmacSecret) -> Result<String, anyhow::Error> {
    let tag = hex::decode(tag)?;
    mac(next, secret)?.verify_slice(&tag)?;
    if !is_local_path(next) {
        anyhow::bail!("{} is not a local path", next);
    }
    Ok(next.to_string())
}
