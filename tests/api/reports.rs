use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{
    assert_is_redirect_to, notification_row, payment_row, report_row, spawn_app, TestApp,
    TestUser,
};

async fn existing_report(app: &TestApp, status: &str) -> (Uuid, Uuid) {
    let report_id = Uuid::new_v4();
    let department_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/reports"))
        .and(query_param("id", format!("eq.{}", report_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([report_row(
            report_id,
            app.tenant.user_id,
            department_id,
            status,
        )])))
        .mount(&app.backend_server)
        .await;
    (report_id, department_id)
}

#[tokio::test]
async fn a_tenant_files_a_report_for_their_department() {
    // Arrange
    let app = spawn_app().await;
    let department_id = Uuid::new_v4();
    let tenant = TestUser::tenant().with_department(department_id);
    tenant.store(&app.backend_server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reports"))
        .and(body_partial_json(json!({
            "tenant_id": tenant.user_id,
            "department_id": department_id,
            "title": "Leaking faucet",
            "description": "The kitchen faucet drips all night",
            "status": "open",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([report_row(
            Uuid::new_v4(),
            tenant.user_id,
            department_id,
            "open",
        )])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&tenant).await;

    // Act - Part 1 - File the report
    let response = app
        .post_form(
            "/tenant/reports/new",
            &json!({
                "title": "  Leaking faucet ",
                "description": "The kitchen faucet drips all night",
            }),
        )
        .await;
    assert_is_redirect_to(&response, "/tenant/dashboard");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/tenant/dashboard").await;
    assert!(html_page.contains("<p><i>Report filed.</i></p>"));
}

#[tokio::test]
async fn an_approved_payment_is_enough_to_file_a_report() {
    // Arrange
    let app = spawn_app().await;
    let department_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/payments"))
        .and(query_param("tenant_id", format!("eq.{}", app.tenant.user_id)))
        .and(query_param("status", "eq.approved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([payment_row(
            Uuid::new_v4(),
            app.tenant.user_id,
            department_id,
            "approved",
            Some("https://files.rentals.pe/receipt.pdf"),
        )])))
        .mount(&app.backend_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reports"))
        .and(body_partial_json(json!({ "department_id": department_id })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([report_row(
            Uuid::new_v4(),
            app.tenant.user_id,
            department_id,
            "open",
        )])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.tenant).await;

    // Act
    let response = app
        .post_form(
            "/tenant/reports/new",
            &json!({ "title": "Broken window", "description": "Cracked in the storm" }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/tenant/dashboard");
}

#[tokio::test]
async fn tenants_without_a_department_cannot_file_reports() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reports"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.tenant).await;

    // Act
    let response = app
        .post_form(
            "/tenant/reports/new",
            &json!({ "title": "Noise", "description": "Loud music" }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/tenant/dashboard");
    let html_page = app.get_html("/tenant/dashboard").await;
    assert!(html_page.contains("You need an assigned department or an approved payment to file reports"));
}

#[tokio::test]
async fn reports_need_a_title_and_a_description() {
    // Arrange
    let app = spawn_app().await;
    let tenant = TestUser::tenant().with_department(Uuid::new_v4());
    tenant.store(&app.backend_server).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/reports"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&tenant).await;

    let test_cases = vec![
        (json!({ "title": "   ", "description": "Loud music" }), "The title is required"),
        (json!({ "title": "Noise", "description": "" }), "The description is required"),
    ];
    for (body, message) in test_cases {
        // Act
        let response = app.post_form("/tenant/reports/new", &body).await;

        // Assert
        assert_is_redirect_to(&response, "/tenant/reports/new");
        let html_page = app.get_html("/tenant/reports/new").await;
        assert!(html_page.contains(message), "missing flash: {}", message);
    }
}

#[tokio::test]
async fn resolving_a_report_notifies_the_tenant() {
    // Arrange
    let app = spawn_app().await;
    let (report_id, department_id) = existing_report(&app, "in_progress").await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reports"))
        .and(query_param("id", format!("eq.{}", report_id)))
        .and(body_partial_json(json!({
            "status": "resolved",
            "resolved_by": app.admin.user_id,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([report_row(
            report_id,
            app.tenant.user_id,
            department_id,
            "resolved",
        )])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({
            "user_id": app.tenant.user_id,
            "title": "Report updated",
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([notification_row(app.tenant.user_id, "Report updated")])),
        )
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(&format!("/admin/reports/{}/resolve", report_id), &json!({}))
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/reports");
    let html_page = app.get_html("/admin/reports").await;
    assert!(html_page.contains("<p><i>The report is now resolved.</i></p>"));
}

#[tokio::test]
async fn closed_reports_cannot_be_reopened() {
    // Arrange
    let app = spawn_app().await;
    let (report_id, _) = existing_report(&app, "closed").await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reports"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(
            &format!("/admin/reports/{}/status", report_id),
            &json!({ "status": "open" }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/reports");
    let html_page = app.get_html("/admin/reports").await;
    assert!(html_page.contains("A report cannot go from Closed to Open"));
}

#[tokio::test]
async fn unknown_report_statuses_are_rejected() {
    // Arrange
    let app = spawn_app().await;
    let (report_id, _) = existing_report(&app, "open").await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(
            &format!("/admin/reports/{}/status", report_id),
            &json!({ "status": "archived" }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/reports");
}
