use reqwest::multipart::{Form, Part};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{
    assert_is_redirect_to, current_month, department_row, payment_row, spawn_app, TestApp,
};

fn receipt() -> Part {
    Part::bytes(b"%PDF-1.4 receipt".to_vec())
        .file_name("receipt.pdf")
        .mime_str("application/pdf")
        .unwrap()
}

async fn available_department(app: &TestApp) -> Uuid {
    let department_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .and(query_param("id", format!("eq.{}", department_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([department_row(department_id, "available")])),
        )
        .mount(&app.backend_server)
        .await;
    department_id
}

#[tokio::test]
async fn a_tenant_can_pay_for_a_unit_from_the_catalog() {
    // Arrange
    let app = spawn_app().await;
    let department_id = available_department(&app).await;
    let payment_id = Uuid::new_v4();
    let pending = payment_row(payment_id, app.tenant.user_id, department_id, "pending", None);
    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .and(body_partial_json(json!({
            "tenant_id": app.tenant.user_id,
            "department_id": department_id,
            "amount": 1200.0,
            "status": "pending",
            "month": current_month(),
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
        .and(path_regex(r"^/storage/v1/object/comprobantes/.+\.pdf$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/payments"))
        .and(query_param("id", format!("eq.{}", payment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payment_row(
            payment_id,
            app.tenant.user_id,
            department_id,
            "pending",
            Some("https://storage.rentals.pe/comprobantes/r.pdf"),
        )])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.tenant).await;

    // Act - Part 1 - Submit the form, the amount defaults to the rent
    let form = Form::new()
        .text("month", current_month())
        .part("receipt", receipt());
    let response = app
        .post_multipart(&format!("/department/{}/pay", department_id), form)
        .await;
    assert_is_redirect_to(&response, &format!("/department/{}", department_id));

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html(&format!("/department/{}", department_id)).await;
    assert!(html_page.contains("<p><i>Payment registered, it is pending review.</i></p>"));
}

#[tokio::test]
async fn admins_cannot_pay_for_a_unit() {
    // Arrange
    let app = spawn_app().await;
    let department_id = available_department(&app).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/payments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act - Part 1 - Submit the form
    let form = Form::new()
        .text("month", current_month())
        .part("receipt", receipt());
    let response = app
        .post_multipart(&format!("/department/{}/pay", department_id), form)
        .await;
    assert_is_redirect_to(&response, &format!("/department/{}", department_id));

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html(&format!("/department/{}", department_id)).await;
    assert!(html_page.contains("<p><i>Only tenants can register payments.</i></p>"));
}
