use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use actix_web_lab::middleware::from_fn;
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::authentication::{reject_anonymous_users, reject_non_admin_users};
use crate::configuration::{Settings, UploadSettings};
use crate::routes::{admin, health_check, log_out, login, login_form, register, register_form, tenant, visitor};
use crate::services::Services;

// Cookie signing keys need at least 64 bytes of material.
const MIN_SECRET_BYTES: usize = 64;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let services = Services::build(&configuration)?;
        Self::build_with_services(configuration, services)
    }

    /// Same as `build`, with services that were wired by the caller.
    pub fn build_with_services(
        configuration: Settings,
        services: Services,
    ) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();
        tracing::info!("app started at: {}:{}", configuration.application.host, port);

        let server = run(
            listener,
            services,
            configuration.uploads,
            configuration.application.hmac_secret,
        )?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    // Only returns when the application is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

// Handlers pull app data out by type, a bare `Secret<String>` would be ambiguous.
#[derive(Clone)]
pub struct HmacSecret(pub Secret<String>);

pub fn run(
    listener: TcpListener,
    services: Services,
    uploads: UploadSettings,
    hmac_secret: Secret<String>,
) -> Result<Server, anyhow::Error> {
    if hmac_secret.expose_secret().len() < MIN_SECRET_BYTES {
        anyhow::bail!(
            "The hmac secret must be at least {} bytes long",
            MIN_SECRET_BYTES
        );
    }
    let secret_key = Key::from(hmac_secret.expose_secret().as_bytes());
    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let services = Data::new(services);
    let uploads = Data::new(uploads);
    let hmac_secret = Data::new(HmacSecret(hmac_secret));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/", web::get().to(visitor::catalog))
            .route("/department/{id}", web::get().to(visitor::department_detail))
            .route("/department/{id}/pay", web::get().to(visitor::pay_department_form))
            .route("/department/{id}/pay", web::post().to(visitor::pay_department))
            .route("/department/{id}/rate", web::post().to(visitor::rate_department))
            .route("/login", web::get().to(login_form))
            .route("/login", web::post().to(login))
            .route("/register", web::get().to(register_form))
            .route("/register", web::post().to(register))
            .route("/logout", web::post().to(log_out))
            .service(
                web::scope("/tenant")
                    .wrap(from_fn(reject_anonymous_users))
                    .route("/dashboard", web::get().to(tenant::tenant_dashboard))
                    .route("/payments/new", web::get().to(tenant::new_payment_form))
                    .route("/payments/new", web::post().to(tenant::new_payment))
                    .route("/payments/{id}/receipt", web::get().to(tenant::upload_receipt_form))
                    .route("/payments/{id}/receipt", web::post().to(tenant::upload_receipt))
                    .route("/reports/new", web::get().to(tenant::new_report_form))
                    .route("/reports/new", web::post().to(tenant::new_report))
                    .route(
                        "/notifications/read-all",
                        web::post().to(tenant::mark_all_notifications_read),
                    )
                    .route(
                        "/notifications/{id}/read",
                        web::post().to(tenant::mark_notification_read),
                    ),
            )
            .service(
                // the outer wrap runs first, anonymous requests never reach the role check
                web::scope("/admin")
                    .wrap(from_fn(reject_non_admin_users))
                    .wrap(from_fn(reject_anonymous_users))
                    .route("/dashboard", web::get().to(admin::admin_dashboard))
                    .route("/payments", web::get().to(admin::payments_list))
                    .route("/payments/{id}", web::get().to(admin::payment_detail))
                    .route("/payments/{id}/approve", web::post().to(admin::approve_payment))
                    .route("/payments/{id}/reject", web::post().to(admin::reject_payment))
                    .route("/reports", web::get().to(admin::reports_list))
                    .route("/reports/{id}/status", web::post().to(admin::update_report_status))
                    .route("/reports/{id}/resolve", web::post().to(admin::resolve_report))
                    .route("/departments", web::get().to(admin::departments_list))
                    .route("/departments/new", web::get().to(admin::new_department_form))
                    .route("/departments/new", web::post().to(admin::create_department))
                    .route("/departments/{id}/edit", web::get().to(admin::edit_department_form))
                    .route("/departments/{id}/edit", web::post().to(admin::update_department))
                    .route("/departments/{id}/delete", web::post().to(admin::delete_department))
                    .route(
                        "/departments/{id}/status",
                        web::post().to(admin::change_department_status),
                    )
                    .route("/users/new", web::get().to(admin::new_admin_form))
                    .route("/users/new", web::post().to(admin::create_admin)),
            )
            .app_data(services.clone())
            .app_data(uploads.clone())
            .app_data(hmac_secret.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
