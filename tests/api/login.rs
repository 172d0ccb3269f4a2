use uuid::Uuid;

use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn an_error_flash_message_is_set_on_failure() {
    // Arrange
    let app = spawn_app().await;

    // Act - Part 1 - Try to login
    let login_body = serde_json::json!({
        "email": "nobody@rentals.pe",
        "password": "random-password",
    });
    let response = app.post_login(&login_body).await;

    // Assert
    assert_is_redirect_to(&response, "/login");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_login_html().await;
    assert!(html_page.contains("<p><i>Invalid email or password.</i></p>"));

    // Act - Part 3 - Reload the login page
    let html_page = app.get_login_html().await;
    assert!(!html_page.contains("Invalid email or password."));
}

#[tokio::test]
async fn a_wrong_password_is_rejected_for_a_known_user() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_login(&serde_json::json!({
            "email": &app.tenant.email,
            "password": Uuid::new_v4().to_string(),
        }))
        .await;

    // Assert
    assert_is_redirect_to(&response, "/login");
    let response = app.get("/tenant/dashboard").await;
    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn tenants_are_redirected_to_their_dashboard_after_login() {
    // Arrange
    let app = spawn_app().await;

    // Act - Part 1 - Login
    let response = app
        .post_login(&serde_json::json!({
            "email": &app.tenant.email,
            "password": &app.tenant.password,
        }))
        .await;
    assert_is_redirect_to(&response, "/tenant/dashboard");

    // Act - Part 2 - Follow the redirect
    let response = app.get("/tenant/dashboard").await;
    assert_eq!(response.status().as_u16(), 200);
    let html_page = response.text().await.unwrap();
    assert!(html_page.contains(&app.tenant.full_name));
}

#[tokio::test]
async fn admins_are_redirected_to_the_admin_dashboard_after_login() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_login(&serde_json::json!({
            "email": &app.admin.email,
            "password": &app.admin.password,
        }))
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/dashboard");
    let response = app.get("/admin/dashboard").await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn a_signed_next_location_is_honoured() {
    // Arrange
    let app = spawn_app().await;
    let next = format!("/department/{}/pay", Uuid::new_v4());
    let login_url = app.signed_login_url(&next);
    let tag = login_url.rsplit_once("tag=").unwrap().1.to_string();

    // Act - Part 1 - The form carries the signed location along
    let html_page = app.get_html(&login_url).await;
    assert!(html_page.contains(&format!(r#"name="next" value="{}""#, next)));

    // Act - Part 2 - Login
    let response = app
        .post_login(&serde_json::json!({
            "email": &app.tenant.email,
            "password": &app.tenant.password,
            "next": &next,
            "tag": tag,
        }))
        .await;

    // Assert
    assert_is_redirect_to(&response, &next);
}

#[tokio::test]
async fn a_tampered_next_location_is_ignored() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .post_login(&serde_json::json!({
            "email": &app.tenant.email,
            "password": &app.tenant.password,
            "next": "https://evil.com/steal",
            "tag": "deadbeef",
        }))
        .await;

    // Assert
    assert_is_redirect_to(&response, "/tenant/dashboard");
}

#[tokio::test]
async fn logout_clears_session_state() {
    // Arrange
    let app = spawn_app().await;

    // Act - Part 1 - Login
    app.login_as(&app.tenant).await;

    // Act - Part 2 - Logout
    let response = app.post_logout().await;
    assert_is_redirect_to(&response, "/");

    // Act - Part 3 - Follow the redirect
    let html_page = app.get_html("/").await;
    assert!(html_page.contains("<p><i>You have been logged out.</i></p>"));

    // Act - Part 4 - Attempt to load the dashboard
    let response = app.get("/tenant/dashboard").await;
    assert_is_redirect_to(&response, "/login");
}
