use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn registering_creates_a_tenant_and_logs_it_in() {
    // Arrange
    let app = spawn_app().await;
    let user_id = Uuid::new_v4();
    let email = format!("new-{}@rentals.pe", user_id.to_simple());
    let row = json!({
        "id": user_id,
        "email": &email,
        "role": "tenant",
        "full_name": "Lucia Torres",
        "department_id": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": null,
    });
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({
            "email": &email,
            "role": "tenant",
            "full_name": "Lucia Torres",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row.clone()])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&app.backend_server)
        .await;

    // Act - Part 1 - Register
    let response = app
        .post_form(
            "/register",
            &json!({
                "email": &email,
                "full_name": "Lucia Torres",
                "password": "secret-password",
                "password_confirm": "secret-password",
            }),
        )
        .await;
    assert_is_redirect_to(&response, "/tenant/dashboard");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/tenant/dashboard").await;
    assert!(html_page.contains("<p><i>Welcome, Lucia Torres!</i></p>"));
}

#[tokio::test]
async fn passwords_must_match_to_register() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;

    // Act - Part 1 - Register
    let response = app
        .post_form(
            "/register",
            &json!({
                "email": "someone@rentals.pe",
                "password": "secret-password",
                "password_confirm": "another-password",
            }),
        )
        .await;
    assert_is_redirect_to(&response, "/register");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/register").await;
    assert!(html_page.contains("<p><i>The passwords do not match.</i></p>"));
}

#[tokio::test]
async fn a_registered_email_cannot_be_reused() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;

    // Act
    let response = app
        .post_form(
            "/register",
            &json!({
                "email": &app.tenant.email,
                "password": "secret-password",
                "password_confirm": "secret-password",
            }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/register");
    let html_page = app.get_html("/register").await;
    assert!(html_page.contains("This email is already registered"));
}

#[tokio::test]
async fn short_passwords_are_rejected() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_form(
            "/register",
            &json!({
                "email": "short@rentals.pe",
                "password": "abc",
                "password_confirm": "abc",
            }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/register");
    let html_page = app.get_html("/register").await;
    assert!(html_page.contains("The password must be at least 6 characters long"));
}
