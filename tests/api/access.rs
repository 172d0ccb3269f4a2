use uuid::Uuid;

use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn you_must_be_logged_in_to_reach_tenant_pages() {
    // Arrange
    let app = spawn_app().await;

    for route in ["/tenant/dashboard", "/tenant/payments/new", "/tenant/reports/new"] {
        // Act
        let response = app.get(route).await;

        // Assert
        assert_is_redirect_to(&response, "/login");
    }
}

#[tokio::test]
async fn you_must_be_logged_in_to_reach_admin_pages() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get("/admin/dashboard").await;

    // Assert
    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn tenants_cannot_reach_admin_pages() {
    // Arrange
    let app = spawn_app().await;
    app.login_as(&app.tenant).await;

    // Act - Part 1 - Try the admin area
    let response = app.get("/admin/payments").await;
    assert_is_redirect_to(&response, "/");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/").await;
    assert!(html_page.contains("You do not have permission to access this page."));
}

#[tokio::test]
async fn tenants_cannot_approve_payments() {
    // Arrange
    let app = spawn_app().await;
    app.login_as(&app.tenant).await;

    // Act
    let response = app
        .post_form(
            &format!("/admin/payments/{}/approve", Uuid::new_v4()),
            &serde_json::json!({}),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/");
}

#[tokio::test]
async fn visitors_are_asked_to_login_before_paying() {
    // Arrange
    let app = spawn_app().await;
    let pay_route = format!("/department/{}/pay", Uuid::new_v4());

    // Act
    let response = app.get(&pay_route).await;

    // Assert
    assert_is_redirect_to(&response, &app.signed_login_url(&pay_route));
}
