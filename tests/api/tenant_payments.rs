use reqwest::multipart::{Form, Part};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{
    assert_is_redirect_to, current_month, department_row, payment_row, spawn_app, TestApp,
    TestUser,
};

fn receipt() -> Part {
    Part::bytes(b"%PDF-1.4 receipt".to_vec())
        .file_name("receipt.pdf")
        .mime_str("application/pdf")
        .unwrap()
}

async fn tenant_with_department(app: &TestApp) -> (TestUser, Uuid) {
    let department_id = Uuid::new_v4();
    let tenant = TestUser::tenant().with_department(department_id);
    tenant.store(&app.backend_server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .and(query_param("id", format!("eq.{}", department_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([department_row(department_id, "occupied")])),
        )
        .mount(&app.backend_server)
        .await;
    (tenant, department_id)
}

#[tokio::test]
async fn tenants_without_a_department_cannot_register_payments() {
    // Arrange
    let app = spawn_app().await;
    app.login_as(&app.tenant).await;

    // Act - Part 1 - Open the form
    let response = app.get("/tenant/payments/new").await;
    assert_is_redirect_to(&response, "/tenant/dashboard");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/tenant/dashboard").await;
    assert!(html_page.contains("<p><i>You do not have a department assigned</i></p>"));
}

#[tokio::test]
async fn the_payment_form_suggests_the_rent_of_the_department() {
    // Arrange
    let app = spawn_app().await;
    let (tenant, _) = tenant_with_department(&app).await;
    app.login_as(&tenant).await;

    // Act
    let html_page = app.get_html("/tenant/payments/new").await;

    // Assert
    assert!(html_page.contains("Ocean view flat"));
    assert!(html_page.contains(r#"enctype="multipart/form-data""#));
    assert!(html_page.contains("S/ 1200.00"));
}

#[tokio::test]
async fn a_payment_with_a_receipt_is_registered_as_pending() {
    // Arrange
    let app = spawn_app().await;
    let (tenant, department_id) = tenant_with_department(&app).await;
    let payment_id = Uuid::new_v4();
    let pending = payment_row(payment_id, tenant.user_id, department_id, "pending", None);
    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .and(body_partial_json(json!({
            "tenant_id": tenant.user_id,
            "department_id": department_id,
            "amount": 850.5,
            "status": "pending",
            "month": current_month(),
            "notes": "Paid by transfer",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([pending.clone()])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", payment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([pending])))
        .mount(&app.backend_server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/comprobantes/\d{8}_\d{6}_[0-9a-f]{8}\.pdf$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    let receipt_url = format!("{}/storage/v1/object/public/comprobantes/r.pdf", app.backend_server.uri());
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", payment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payment_row(
            payment_id,
            tenant.user_id,
            department_id,
            "pending",
            Some(&receipt_url),
        )])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&tenant).await;

    // Act - Part 1 - Submit the form
    let form = Form::new()
        .text("month", current_month())
        .text("amount", "850.50")
        .text("notes", "  Paid by transfer ")
        .part("receipt", receipt());
    let response = app.post_multipart("/tenant/payments/new", form).await;
    assert_is_redirect_to(&response, "/tenant/dashboard");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/tenant/dashboard").await;
    assert!(html_page.contains("<p><i>Payment registered, it is pending review.</i></p>"));
}

#[tokio::test]
async fn a_receipt_is_required_to_register_a_payment() {
    // Arrange
    let app = spawn_app().await;
    let (tenant, _) = tenant_with_department(&app).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&tenant).await;

    // Act
    let form = Form::new()
        .text("month", current_month())
        .text("amount", "1200");
    let response = app.post_multipart("/tenant/payments/new", form).await;

    // Assert
    assert_is_redirect_to(&response, "/tenant/payments/new");
    let html_page = app.get_html("/tenant/payments/new").await;
    assert!(html_page.contains("You must attach the payment receipt"));
}

#[tokio::test]
async fn months_too_far_ahead_are_rejected() {
    // Arrange
    let app = spawn_app().await;
    let (tenant, _) = tenant_with_department(&app).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&tenant).await;

    // Act
    let form = Form::new()
        .text("month", "2099-01")
        .text("amount", "1200")
        .part("receipt", receipt());
    let response = app.post_multipart("/tenant/payments/new", form).await;

    // Assert
    assert_is_redirect_to(&response, "/tenant/payments/new");
}

#[tokio::test]
async fn tenants_cannot_upload_receipts_for_someone_elses_payment() {
    // Arrange
    let app = spawn_app().await;
    let payment_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", payment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payment_row(
            payment_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "pending",
            None,
        )])))
        .mount(&app.backend_server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.tenant).await;

    // Act
    let form = Form::new().part("receipt", receipt());
    let response = app
        .post_multipart(&format!("/tenant/payments/{}/receipt", payment_id), form)
        .await;

    // Assert
    assert_is_redirect_to(&response, "/tenant/dashboard");
    let html_page = app.get_html("/tenant/dashboard").await;
    assert!(html_page.contains("<p><i>Payment not found</i></p>"));
}

#[tokio::test]
async fn receipts_over_ten_megabytes_are_refused() {
    // Arrange
    let app = spawn_app().await;
    let (tenant, _) = tenant_with_department(&app).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&tenant).await;

    // Act - Part 1 - Submit an oversized receipt
    let oversized = Part::bytes(vec![b'x'; 10 * 1024 * 1024 + 1])
        .file_name("receipt.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = Form::new()
        .text("month", current_month())
        .part("receipt", oversized);
    let response = app.post_multipart("/tenant/payments/new", form).await;
    assert_is_redirect_to(&response, "/tenant/payments/new");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/tenant/payments/new").await;
    assert!(html_page.contains("<p><i>The file is too large, the limit is 10 MB</i></p>"));
}
