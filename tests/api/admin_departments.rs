use reqwest::multipart::{Form, Part};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{assert_is_redirect_to, department_row, spawn_app, TestApp};

async fn existing_department(app: &TestApp, status: &str) -> Uuid {
    let department_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/departments"))
        .and(query_param("id", format!("eq.{}", department_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([department_row(department_id, status)])),
        )
        .mount(&app.backend_server)
        .await;
    department_id
}

#[tokio::test]
async fn admins_can_create_departments() {
    // Arrange
    let app = spawn_app().await;
    let department_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/rest/v1/departments"))
        .and(body_partial_json(json!({
            "title": "Ocean view flat",
            "address": "Av. Larco 1234, Miraflores",
            "price": 1200.0,
            "status": "available",
            "rooms": 2,
            "sea_view": true,
            "parking": false,
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([department_row(department_id, "available")])),
        )
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act - Part 1 - Submit the form
    let form = Form::new()
        .text("title", " Ocean view flat ")
        .text("address", "Av. Larco 1234, Miraflores")
        .text("price", "1200")
        .text("rooms", "2")
        .text("sea_view", "on");
    let response = app.post_multipart("/admin/departments/new", form).await;
    assert_is_redirect_to(&response, "/admin/departments");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/admin/departments").await;
    assert!(html_page.contains("<p><i>Department created.</i></p>"));
}

#[tokio::test]
async fn a_failed_image_upload_keeps_the_new_department() {
    // Arrange
    let app = spawn_app().await;
    let department_id = existing_department(&app, "available").await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/departments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([department_row(department_id, "available")])),
        )
        .expect(1)
        .mount(&app.backend_server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/.+$"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"Bucket not found"}"#))
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let image = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("front.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = Form::new()
        .text("title", "Ocean view flat")
        .text("address", "Av. Larco 1234, Miraflores")
        .text("price", "1200")
        .part("image", image);
    let response = app.post_multipart("/admin/departments/new", form).await;

    // Assert
    assert_is_redirect_to(&response, "/admin/departments");
    let html_page = app.get_html("/admin/departments").await;
    assert!(html_page.contains("The department was created, but the image could not be uploaded"));
}

#[tokio::test]
async fn incomplete_departments_are_rejected() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    let test_cases = vec![
        (
            Form::new().text("address", "Jr. Puno 45").text("price", "900"),
            "Title and address are required",
        ),
        (
            Form::new().text("title", "Loft").text("address", "Jr. Puno 45").text("price", "0"),
            "The price must be greater than 0",
        ),
        (
            Form::new().text("title", "Loft").text("address", "Jr. Puno 45"),
            "The price is required",
        ),
    ];
    for (form, message) in test_cases {
        // Act
        let response = app.post_multipart("/admin/departments/new", form).await;

        // Assert
        assert_is_redirect_to(&response, "/admin/departments/new");
        let html_page = app.get_html("/admin/departments/new").await;
        assert!(html_page.contains(message), "missing flash: {}", message);
    }
}

#[tokio::test]
async fn occupied_departments_cannot_be_deleted() {
    // Arrange
    let app = spawn_app().await;
    let department_id = existing_department(&app, "occupied").await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(&format!("/admin/departments/{}/delete", department_id), &json!({}))
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/departments");
    let html_page = app.get_html("/admin/departments").await;
    assert!(html_page.contains("An occupied department cannot be deleted"));
}

#[tokio::test]
async fn available_departments_can_be_deleted() {
    // Arrange
    let app = spawn_app().await;
    let department_id = existing_department(&app, "available").await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/departments"))
        .and(query_param("id", format!("eq.{}", department_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(&format!("/admin/departments/{}/delete", department_id), &json!({}))
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/departments");
}

#[tokio::test]
async fn releasing_an_occupied_department_unassigns_its_tenants() {
    // Arrange
    let app = spawn_app().await;
    let department_id = existing_department(&app, "occupied").await;
    let tenant = json!({
        "id": Uuid::new_v4(),
        "email": "resident@rentals.pe",
        "role": "tenant",
        "full_name": null,
        "department_id": department_id,
        "created_at": null,
        "updated_at": null,
    });
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("department_id", format!("eq.{}", department_id)))
        .and(query_param("role", "eq.tenant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([tenant.clone()])))
        .mount(&app.backend_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "department_id": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([tenant])))
        .expect(1)
        .mount(&app.backend_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/departments"))
        .and(body_partial_json(json!({ "status": "available" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([department_row(department_id, "available")])),
        )
        .expect(1)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(
            &format!("/admin/departments/{}/status", department_id),
            &json!({ "status": "available" }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/departments");
    let html_page = app.get_html("/admin/departments").await;
    assert!(html_page.contains("The department is now available, 1 tenant(s) were unassigned."));
}

#[tokio::test]
async fn departments_under_maintenance_cannot_be_let_directly() {
    // Arrange
    let app = spawn_app().await;
    let department_id = existing_department(&app, "maintenance").await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act
    let response = app
        .post_form(
            &format!("/admin/departments/{}/status", department_id),
            &json!({ "status": "occupied" }),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/admin/departments");
    let html_page = app.get_html("/admin/departments").await;
    assert!(html_page.contains("A department cannot go from maintenance to occupied"));
}

#[tokio::test]
async fn images_over_five_megabytes_are_refused() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/departments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.backend_server)
        .await;
    app.login_as(&app.admin).await;

    // Act - Part 1 - Submit an oversized image
    let image = Part::bytes(vec![0xFF; 5 * 1024 * 1024 + 1])
        .file_name("front.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = Form::new()
        .text("title", "Ocean view flat")
        .text("address", "Av. Larco 1234, Miraflores")
        .text("price", "1200")
        .part("image", image);
    let response = app.post_multipart("/admin/departments/new", form).await;
    assert_is_redirect_to(&response, "/admin/departments/new");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/admin/departments/new").await;
    assert!(html_page.contains("<p><i>The file is too large, the limit is 5 MB</i></p>"));
}
