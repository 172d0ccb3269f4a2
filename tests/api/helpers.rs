use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rental_portal::configuration::get_configuration;
use rental_portal::routes::login::login_url_with_next;
use rental_portal::startup::{Application, HmacSecret};
use rental_portal::telemetry::{
    get_line_subscriber, get_subscriber, init_subscriber,
};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // The sink is part of the type returned by `get_subscriber`, so each
    // branch has to initialise its own subscriber.
    match std::env::var("TEST_LOG") {
        Ok(v) => {
            if v == "json" {
                println!("Using JSON output");
                init_subscriber(get_subscriber(
                    subscriber_name,
                    default_filter_level,
                    std::io::stdout,
                ));
            } else {
                println!("Using text output");
                init_subscriber(get_line_subscriber(
                    default_filter_level,
                    std::io::stdout,
                ));
            }
        }
        _ => {
            let subscriber = get_subscriber(
                subscriber_name,
                default_filter_level,
                std::io::sink,
            );
            init_subscriber(subscriber);
        }
    };
});

// Mocks mounted by a test win over the catch-all ones below.
const FALLBACK_PRIORITY: u8 = u8::MAX;

pub struct TestUser {
    pub user_id: Uuid,
    pub email: String,
    pub password: String,
    pub role: &'static str,
    pub full_name: String,
    pub department_id: Option<Uuid>,
}

impl TestUser {
    pub fn tenant() -> Self {
        Self::generate("tenant", "Rosa Quispe")
    }

    pub fn admin() -> Self {
        Self::generate("admin", "Carlos Mendoza")
    }

    fn generate(role: &'static str, full_name: &str) -> Self {
        let user_id = Uuid::new_v4();
        Self {
            user_id,
            // the mailer refuses reserved domains such as example.com
            email: format!("{}-{}@rentals.pe", role, user_id.to_simple()),
            password: Uuid::new_v4().to_string(),
            role,
            full_name: full_name.to_string(),
            department_id: None,
        }
    }

    pub fn with_department(mut self, department_id: Uuid) -> Self {
        self.department_id = Some(department_id);
        self
    }

    /// The row as the users table returns it, without credentials.
    pub fn row(&self) -> Value {
        json!({
            "id": self.user_id,
            "email": self.email,
            "role": self.role,
            "full_name": self.full_name,
            "department_id": self.department_id,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": null,
        })
    }

    fn credentials_row(&self) -> Value {
        // Cheap parameters, verification reads them back from the hash.
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(15000, 2, 1, None).unwrap(),
        )
        .hash_password(self.password.as_bytes(), &salt)
        .unwrap()
        .to_string();
        let mut row = self.row();
        row["password_hash"] = json!(password_hash);
        row
    }

    /// Make the user resolvable both by email (login) and by id (sessions).
    pub async fn store(&self, backend: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("email", format!("eq.{}", self.email)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([self.credentials_row()])))
            .mount(backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", format!("eq.{}", self.user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([self.row()])))
            .mount(backend)
            .await;
    }
}

pub fn department_row(department_id: Uuid, status: &str) -> Value {
    json!({
        "id": department_id,
        "title": "Ocean view flat",
        "address": "Av. Larco 1234, Miraflores",
        "price": 1200.0,
        "status": status,
        "description": "Two bedrooms close to the boardwalk",
        "rooms": 2,
        "bathrooms": 1,
        "area": "85.5",
        "image_url": null,
        "has_terrace": false,
        "has_balcony": true,
        "sea_view": true,
        "parking": null,
        "furnished": false,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": null,
    })
}

pub fn payment_row(
    payment_id: Uuid,
    tenant_id: Uuid,
    department_id: Uuid,
    status: &str,
    receipt_url: Option<&str>,
) -> Value {
    json!({
        "id": payment_id,
        "tenant_id": tenant_id,
        "department_id": department_id,
        "amount": "1200.00",
        "status": status,
        "month": current_month(),
        "receipt_url": receipt_url,
        "notes": null,
        "reviewed_by": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": null,
    })
}

pub fn report_row(report_id: Uuid, tenant_id: Uuid, department_id: Uuid, status: &str) -> Value {
    json!({
        "id": report_id,
        "tenant_id": tenant_id,
        "department_id": department_id,
        "title": "Leaking faucet",
        "description": "The kitchen faucet drips all night",
        "status": status,
        "resolved_by": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": null,
    })
}

pub fn notification_row(user_id: Uuid, title: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "title": title,
        "message": "",
        "link": null,
        "type": null,
        "is_read": false,
        "created_at": "2024-01-01T00:00:00Z",
    })
}

pub fn current_month() -> String {
    chrono::Utc::now().format("%Y-%m").to_string()
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub backend_server: MockServer,
    pub email_server: MockServer,
    pub hmac_secret: HmacSecret,
    pub api_client: reqwest::Client,
    pub tenant: TestUser,
    pub admin: TestUser,
}

impl TestApp {
    pub async fn get(&self, route: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", &self.address, route))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_html(&self, route: &str) -> String {
        self.get(route).await.text().await.unwrap()
    }

    pub async fn post_form<Body>(&self, route: &str, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}{}", &self.address, route))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_multipart(
        &self,
        route: &str,
        form: reqwest::multipart::Form,
    ) -> reqwest::Response {
        self.api_client
            .post(&format!("{}{}", &self.address, route))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.post_form("/login", body).await
    }

    pub async fn get_login_html(&self) -> String {
        self.get_html("/login").await
    }

    pub async fn post_logout(&self) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/logout", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login_as(&self, user: &TestUser) {
        let response = self
            .post_login(&json!({
                "email": user.email,
                "password": user.password,
            }))
            .await;
        assert_eq!(response.status().as_u16(), 303, "login of {} failed", user.email);
    }

    pub fn signed_login_url(&self, next: &str) -> String {
        login_url_with_next(next, &self.hmac_secret).unwrap()
    }

    /// Reads nobody mocked answer with an empty table, writes are refused.
    pub async fn mount_empty_tables(&self) {
        Mock::given(method("GET"))
            .and(path_regex(r"^/rest/v1/.+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&self.backend_server)
            .await;
    }
}

pub async fn spawn_app() -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    // Stand-ins for the hosted backend and for Postmark's API
    let backend_server = MockServer::start().await;
    let email_server = MockServer::start().await;

    // Randomize configuration to ensure test isolation
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // Use random port
        c.application.port = 0;
        c.application.base_url = "http://127.0.0.1".into();
        c.backend.base_url = backend_server.uri();
        c.backend.service_role_key = Secret::new("test-service-role".into());
        c.email_client.base_url = email_server.uri();
        c
    };
    let hmac_secret = HmacSecret(configuration.application.hmac_secret.clone());

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    let app = TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        port: application_port,
        backend_server,
        email_server,
        hmac_secret,
        api_client,
        tenant: TestUser::tenant(),
        admin: TestUser::admin(),
    };
    app.tenant.store(&app.backend_server).await;
    app.admin.store(&app.backend_server).await;
    app.mount_empty_tables().await;
    app
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
