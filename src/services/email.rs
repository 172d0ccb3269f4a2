use crate::domain::UserEmail;
use crate::email_client::EmailClient;

const BLOCKED_DOMAINS: [&str; 5] = [
    "admin.com",
    "localhost",
    "localdomain",
    "example.com",
    "test.com",
];

/// Best effort delivery: failures are logged and reported as `false`, never raised.
#[derive(Clone)]
pub struct EmailService {
    client: Option<EmailClient>,
    // appended to every message so recipients can reach the portal
    base_url: String,
}

impl EmailService {
    pub fn new(client: Option<EmailClient>, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn disabled() -> Self {
        Self {
            client: None,
            base_url: String::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    #[tracing::instrument(name = "Send email", skip(self, recipients, body))]
    pub async fn send_email(&self, recipients: &[&str], subject: &str, body: &str) -> bool {
        let client = match &self.client {
            Some(client) => client,
            None => return false,
        };
        let recipients = deliverable(recipients);
        if recipients.is_empty() {
            return false;
        }

        let (html, text) = self.render(body);
        let mut delivered = true;
        for recipient in &recipients {
            if let Err(e) = client.send_email(recipient, subject, &html, &text).await {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to deliver an email",
                );
                delivered = false;
            }
        }
        delivered
    }

    fn render(&self, body: &str) -> (String, String) {
        let mut html = format!(
            "<p>{}</p>",
            htmlescape::encode_minimal(body).replace('\n', "<br>")
        );
        let mut text = body.to_string();
        if !self.base_url.is_empty() {
            let link = htmlescape::encode_minimal(&self.base_url);
            html.push_str(&format!(r#"<p><a href="{}">{}</a></p>"#, link, link));
            text.push_str(&format!("\n\n{}", self.base_url));
        }
        (html, text)
    }
}

fn deliverable(recipients: &[&str]) -> Vec<UserEmail> {
    recipients
        .iter()
        .filter_map(|r| UserEmail::parse(r.to_string()).ok())
        .filter(|email| !BLOCKED_DOMAINS.contains(&email.domain()))
        .collect()
}
