use validator::validate_email;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct UserEmail(String);

impl UserEmail {
    /// Normalises (trim + lowercase) and validates an address.
    pub fn parse(s: String) -> Result<UserEmail, String> {
        let normalised = s.trim().to_lowercase();
        if validate_email(&normalised) && has_top_level_domain(&normalised) {
            Ok(Self(normalised))
        } else {
            Err(format!("{} is not a valid email address.", s))
        }
    }

    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

// validator accepts `user@localhost`; addresses here need a dotted domain
// ending in an alphabetic TLD of at least two characters.
fn has_top_level_domain(email: &str) -> bool {
    let domain = match email.rsplit_once('@') {
        Some((_, domain)) => domain,
        None => return false,
    };
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty()
                && tld.len() >= 2
                && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

impl AsRef<str> for UserEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
