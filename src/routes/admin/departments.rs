use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use std::fmt::Write;
use uuid::Uuid;

use crate::configuration::UploadSettings;
use crate::domain::{Department, DepartmentDraft, DepartmentStatus, UserRole};
use crate::routes::uploads::{MultipartForm, UploadedFile};
use crate::routes::views::{checked, escape, money, options, page};
use crate::services::{DepartmentError, Services};
use crate::utils::{e500, see_other};

const LIST: &str = "/admin/departments";

const STATUSES: [(&str, &str); 3] = [
    ("available", "Available"),
    ("occupied", "Occupied"),
    ("maintenance", "Maintenance"),
];

/// Build a draft from the department form. `current_image` is kept when no URL is typed.
fn draft_from_form(form: &MultipartForm, current_image: Option<&str>) -> Result<DepartmentDraft, String> {
    let price = form
        .number::<f64>("price")?
        .ok_or_else(|| "The price is required".to_string())?;
    let status = match form.text("status") {
        Some(status) => DepartmentStatus::parse(status)?,
        None => DepartmentStatus::Available,
    };
    Ok(DepartmentDraft {
        title: form.text("title").unwrap_or_default().to_string(),
        address: form.text("address").unwrap_or_default().to_string(),
        price,
        status,
        description: form.text("description").map(str::to_string),
        rooms: form.number("rooms")?,
        bathrooms: form.number("bathrooms")?,
        area: form.number("area")?,
        image_url: form
            .text("image_url")
            .or(current_image)
            .map(str::to_string),
        has_terrace: form.flag("has_terrace"),
        has_balcony: form.flag("has_balcony"),
        sea_view: form.flag("sea_view"),
        parking: form.flag("parking"),
        furnished: form.flag("furnished"),
    })
}

fn department_form(action: &str, draft: Option<&DepartmentDraft>, max_image_bytes: usize) -> String {
    let text = |value: Option<&str>| escape(value.unwrap_or(""));
    let number = |value: Option<String>| value.unwrap_or_default();
    format!(
        r#"<form action="{action}" method="post" enctype="multipart/form-data">
        <label>Title <input type="text" name="title" value="{title}" required></label>
        <label>Address <input type="text" name="address" value="{address}" required></label>
        <label>Price <input type="number" step="0.01" name="price" value="{price}" required></label>
        <label>Status <select name="status">{statuses}</select></label>
        <label>Description <textarea name="description">{description}</textarea></label>
        <label>Rooms <input type="number" name="rooms" min="0" value="{rooms}"></label>
        <label>Bathrooms <input type="number" name="bathrooms" min="0" value="{bathrooms}"></label>
        <label>Area (m²) <input type="number" step="0.01" name="area" value="{area}"></label>
        <label><input type="checkbox" name="has_terrace" value="1"{terrace}> Terrace</label>
        <label><input type="checkbox" name="has_balcony" value="1"{balcony}> Balcony</label>
        <label><input type="checkbox" name="sea_view" value="1"{sea_view}> Sea view</label>
        <label><input type="checkbox" name="parking" value="1"{parking}> Parking</label>
        <label><input type="checkbox" name="furnished" value="1"{furnished}> Furnished</label>
        <label>Image (max {limit} MB) <input type="file" name="image" accept="image/*"></label>
        <label>or image URL <input type="url" name="image_url" value="{image_url}"></label>
        <button type="submit">Save</button>
    </form>"#,
        action = action,
        title = text(draft.map(|d| d.title.as_str())),
        address = text(draft.map(|d| d.address.as_str())),
        price = number(draft.map(|d| d.price.to_string())),
        statuses = options(STATUSES, draft.map_or("available", |d| d.status.as_str())),
        description = text(draft.and_then(|d| d.description.as_deref())),
        rooms = number(draft.and_then(|d| d.rooms).map(|r| r.to_string())),
        bathrooms = number(draft.and_then(|d| d.bathrooms).map(|b| b.to_string())),
        area = number(draft.and_then(|d| d.area).map(|a| a.to_string())),
        terrace = checked(draft.map_or(false, |d| d.has_terrace)),
        balcony = checked(draft.map_or(false, |d| d.has_balcony)),
        sea_view = checked(draft.map_or(false, |d| d.sea_view)),
        parking = checked(draft.map_or(false, |d| d.parking)),
        furnished = checked(draft.map_or(false, |d| d.furnished)),
        limit = max_image_bytes / (1024 * 1024),
        image_url = text(draft.and_then(|d| d.image_url.as_deref())),
    )
}

fn department_row(department: &Department) -> String {
    format!(
        r#"<tr>
        <td><a href="/department/{id}">{title}</a></td>
        <td>{address}</td>
        <td>{price}</td>
        <td>
            <form action="/admin/departments/{id}/status" method="post" style="display:inline">
                <select name="status">{statuses}</select>
                <button type="submit">Change</button>
            </form>
        </td>
        <td>
            <a href="/admin/departments/{id}/edit">Edit</a>
            <form action="/admin/departments/{id}/delete" method="post" style="display:inline">
                <button type="submit">Delete</button>
            </form>
        </td>
    </tr>"#,
        id = department.id,
        title = escape(&department.title),
        address = escape(&department.address),
        price = money(department.price),
        statuses = options(STATUSES, department.status.as_str()),
    )
}

// Validation and business rule failures go back to the user.
fn flash_failure(e: DepartmentError) -> Result<(), actix_web::Error> {
    match e {
        DepartmentError::Unexpected(e) => Err(e500(e)),
        e => {
            FlashMessage::error(e.to_string()).send();
            Ok(())
        }
    }
}

pub async fn departments_list(
    services: web::Data<Services>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let departments = services
        .departments
        .get_all_departments(None, false, None)
        .await
        .map_err(e500)?;
    let mut content = String::from(
        r#"<p><a href="/admin/departments/new">New department</a></p>
    <table><tr><th>Title</th><th>Address</th><th>Price</th><th>Status</th><th></th></tr>"#,
    );
    for department in &departments {
        let _ = write!(content, "{}", department_row(department));
    }
    content.push_str("</table>");
    Ok(page("Departments", UserRole::Admin, &flash_messages, &content))
}

pub async fn new_department_form(
    uploads: web::Data<UploadSettings>,
    flash_messages: IncomingFlashMessages,
) -> HttpResponse {
    let content = department_form("/admin/departments/new", None, uploads.max_image_bytes);
    page("New department", UserRole::Admin, &flash_messages, &content)
}

#[tracing::instrument(name = "New department", skip_all)]
pub async fn create_department(
    payload: Multipart,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
) -> Result<HttpResponse, actix_web::Error> {
    let back = "/admin/departments/new";
    let mut form = match MultipartForm::read(payload, uploads.max_image_bytes).await {
        Ok(form) => form,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return Ok(see_other(back));
        }
    };
    let image = form.take_file("image");
    let draft = match draft_from_form(&form, None) {
        Ok(draft) => draft,
        Err(message) => {
            FlashMessage::error(message).send();
            return Ok(see_other(back));
        }
    };

    let department = match services.departments.create_department(draft).await {
        Ok(department) => department,
        Err(e) => {
            flash_failure(e)?;
            return Ok(see_other(back));
        }
    };
    if let Some(UploadedFile { file_name, content }) = image {
        if let Err(e) = services
            .departments
            .upload_department_image(department.id, content, &file_name)
            .await
        {
            tracing::warn!(error.cause_chain = ?e, "The image of a new department was not stored");
            FlashMessage::warning(format!(
                "The department was created, but the image could not be uploaded: {}",
                e
            ))
            .send();
            return Ok(see_other(LIST));
        }
    }
    FlashMessage::success("Department created.").send();
    Ok(see_other(LIST))
}

async fn existing(services: &Services, department_id: Uuid) -> Result<Option<Department>, actix_web::Error> {
    let department = services
        .departments
        .get_department_by_id(department_id)
        .await
        .map_err(e500)?;
    if department.is_none() {
        FlashMessage::error("Department not found").send();
    }
    Ok(department)
}

pub async fn edit_department_form(
    department_id: web::Path<Uuid>,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let department = match existing(&services, department_id.into_inner()).await? {
        Some(department) => department,
        None => return Ok(see_other(LIST)),
    };
    let action = format!("/admin/departments/{}/edit", department.id);
    let content = department_form(&action, Some(&department.to_draft()), uploads.max_image_bytes);
    Ok(page("Edit department", UserRole::Admin, &flash_messages, &content))
}

#[tracing::instrument(name = "Edit department", skip_all, fields(department_id = %*department_id))]
pub async fn update_department(
    department_id: web::Path<Uuid>,
    payload: Multipart,
    services: web::Data<Services>,
    uploads: web::Data<UploadSettings>,
) -> Result<HttpResponse, actix_web::Error> {
    let department = match existing(&services, department_id.into_inner()).await? {
        Some(department) => department,
        None => return Ok(see_other(LIST)),
    };
    let back = format!("/admin/departments/{}/edit", department.id);
    let mut form = match MultipartForm::read(payload, uploads.max_image_bytes).await {
        Ok(form) => form,
        Err(e) => {
            FlashMessage::error(e.to_string()).send();
            return Ok(see_other(&back));
        }
    };
    let image = form.take_file("image");
    let mut draft = match draft_from_form(&form, department.image_url.as_deref()) {
        Ok(draft) => draft,
        Err(message) => {
            FlashMessage::error(message).send();
            return Ok(see_other(&back));
        }
    };

    if let Some(UploadedFile { file_name, content }) = image {
        match services
            .departments
            .upload_department_image(department.id, content, &file_name)
            .await
        {
            Ok(updated) => draft.image_url = updated.image_url,
            Err(e) => {
                tracing::warn!(error.cause_chain = ?e, "The new image of a department was not stored");
                FlashMessage::warning(format!("The image could not be uploaded: {}", e)).send();
            }
        }
    }

    match services.departments.update_department(department.id, draft).await {
        Ok(_) => {
            FlashMessage::success("Department updated.").send();
            Ok(see_other(LIST))
        }
        Err(e) => {
            flash_failure(e)?;
            Ok(see_other(&back))
        }
    }
}

#[tracing::instrument(name = "Delete department", skip_all, fields(department_id = %*department_id))]
pub async fn delete_department(
    department_id: web::Path<Uuid>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    match services
        .departments
        .delete_department(department_id.into_inner())
        .await
    {
        Ok(()) => FlashMessage::success("Department deleted.").send(),
        Err(e) => flash_failure(e)?,
    }
    Ok(see_other(LIST))
}

#[derive(serde::Deserialize)]
pub struct StatusForm {
    status: String,
}

#[tracing::instrument(name = "Change department status", skip_all, fields(department_id = %*department_id))]
pub async fn change_department_status(
    department_id: web::Path<Uuid>,
    form: web::Form<StatusForm>,
    services: web::Data<Services>,
) -> Result<HttpResponse, actix_web::Error> {
    let status = match DepartmentStatus::parse(&form.status) {
        Ok(status) => status,
        Err(message) => {
            FlashMessage::error(message).send();
            return Ok(see_other(LIST));
        }
    };
    match services
        .departments
        .change_status(department_id.into_inner(), status)
        .await
    {
        Ok(change) if change.released_tenants > 0 => FlashMessage::success(format!(
            "The department is now {}, {} tenant(s) were unassigned.",
            change.department.status, change.released_tenants
        ))
        .send(),
        Ok(change) => {
            FlashMessage::success(format!("The department is now {}.", change.department.status)).send()
        }
        Err(e) => flash_failure(e)?,
    }
    Ok(see_other(LIST))
}
