use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use std::fmt::Write;
use uuid::Uuid;

use crate::configuration::UploadSettings;
use crate::domain::{Department, DepartmentStatus, User, UserRole};
use crate::routes::login::login_url_with_next;
use crate::routes::views::{escape, money, page};
use crate::routes::{current_user, payment_form};
use crate::services::{RatingError, Services};
use crate::session_state::TypedSession;
use crate::startup::HmacSecret;
use crate::utils::{e500, see_other};

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

// Anonymous visitors are sent to the login form and brought back to `next` afterwards.
async fn require_login(
    session: &TypedSession,
    services: &Services,
    secret: &HmacSecret,
    next: &str,
) -> Result<Result<User, HttpResponse>, actix_web::Error> {
    match current_user(session, services).await? {
        Some(user) => Ok(Ok(user)),
        None => {
            FlashMessage::warning("You must log in to continue.").send();
            let location = login_url_with_next(next, secret).map_err(e500)?;
            Ok(Err(see_other(&location)))
        }
    }
}

#[tracing::instrument(name = "Department detail", skip(services, session, flash_messages))]
pub async fn department_detail(
    department_id: web::Path<Uuid>,
    services: web::Data<Services>,
    session: TypedSession,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let department_id = department_id.into_inner();
    let department = match existing(&services, department_id).await? {
        Some(department) => department,
        None => return Ok(see_other("/")),
    };
    let summary = services.ratings.summary(department_id).await.map_err(e500)?;
    let ratings = services
        .ratings
        .get_department_ratings(department_id)
        .await
        .map_err(e500)?;
    let user = current_user(&session, &services).await?;

    let mut content = String::new();
    if let Some(url) = department.image_url.as_deref() {
        let _ = write!(content, r#"<img src="{}" alt="" width="480">"#, escape(url));
    }
    let _ = write!(
        content,
        r#"<p>{address}</p>
    <p>Monthly rent: {price} - Status: {status}</p>
    <p>{description}</p>
    <ul>
        <li>Rooms: {rooms}</li>
        <li>Bathrooms: {bathrooms}</li>
        <li>Area: {area}</li>
        <li>Features: {features}</li>
    </ul>"#,
        address = escape(&department.address),
        price = money(department.price),
        status = department.status,
        description = escape(department.description.as_deref().unwrap_or("")),
        rooms = department.rooms.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
        bathrooms = department.bathrooms.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
        area = department.area.map(|a| format!("{} m²", a)).unwrap_or_else(|| "-".into()),
        features = department.features().join(", "),
    );

    let can_pay = department.status == DepartmentStatus::Available
        && user.as_ref().map_or(true, |u| u.role != UserRole::Admin);
    if can_pay {
        let _ = write!(
            content,
            r#"<p><a href="/department/{}/pay">Rent this department</a></p>"#,
            department.id
        );
    }

    match summary.average {
        Some(average) => {
            let _ = write!(
                content,
                "<h2>Ratings</h2><p>{:.1} / 5 from {} ratings</p>",
                average, summary.count
            );
        }
        None => content.push_str("<h2>Ratings</h2><p>No ratings yet.</p>"),
    }
    content.push_str("<ul>");
    for rating in &ratings {
        let _ = write!(
            content,
            "<li>{} {}</li>",
            rating.stars(),
            escape(rating.comment.as_deref().unwrap_or(""))
        );
    }
    content.push_str("</ul>");

    if let Some(user) = &user {
        if services.ratings.can_rate(user, department_id).await.map_err(e500)? {
            let _ = write!(
                content,
                r#"<form action="/department/{}/rate" method="post">
        <label>Rating
            <select name="rating">
                <option value="5">5</option><option value="4">4</option>
                <option value="3">3</option><option value="2">2</option>
                <option value="1">1</option>
            </select>
        </label>
        <label>Comment <textarea name="comment"></textarea></label>
        <button type="submit">Rate</button>
    </form>"#,
                department_id
            );
        }
    }

    let role = user.as_ref().map_or(UserRole::Visitor, |u| u.role);
    Ok(page(&department.title, role, &flash_messages, &content))
}

pub async fn pay_department_form(
    department_id: web::Path<Uuid>,
    services: web::Data<Services>,
    session: TypedSession,
    secret: web::Data<HmacSecret>,
    uploads: web::Data<UploadSettings>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let department_id = department_id.into_inner();
    let action = format!("/department/{}/pay", department_id);
    let user = match require_login(&session, &services, &secret, &action).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let department = match existing(&services, department_id).await? {
        Some(department) => department,
        None => return Ok(see_other("/")),
    };
    let content = payment_form::render(&department, &action, uploads.max_receipt_bytes);
    Ok(page("Pay rent", user.role, &flash_messages, &content))
}

#[tracing::instrument(name = "Pay department", skip(payload, services, session, secret, uploads))]
pub async fn pay_department(
    department_id: web::Path<Uuid>,
    payload: Multipart,
    services: web::Data<Services>,
    session: TypedSession,
    secret: web::Data<HmacSecret>,
    uploads: web::Data<UploadSettings>,
) -> Result<HttpResponse, actix_web::Error> {
    let department_id = department_id.into_inner();
    let action = format!("/department/{}/pay", department_id);
    let user = match require_login(&session, &services, &secret, &action).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    if !user.is_tenant() {
        FlashMessage::error("Only tenants can register payments.").send();
        return Ok(see_other(&format!("/department/{}", department_id)));
    }
    let department = match existing(&services, department_id).await? {
        Some(department) => department,
        None => return Ok(see_other("/")),
    };

    match payment_form::submit(&services, user.id, &department, payload, uploads.max_receipt_bytes).await? {
        Ok(_) => {
            FlashMessage::success("Payment registered, it is pending review.").send();
            Ok(see_other(&format!("/department/{}", department_id)))
        }
        Err(message) => {
            FlashMessage::error(message).send();
            Ok(see_other(&action))
        }
    }
}

#[derive(serde::Deserialize)]
pub struct RatingForm {
    rating: String,
    comment: Option<String>,
}

#[tracing::instrument(name = "Rate department", skip(form, services, session, secret))]
pub async fn rate_department(
    department_id: web::Path<Uuid>,
    form: web::Form<RatingForm>,
    services: web::Data<Services>,
    session: TypedSession,
    secret: web::Data<HmacSecret>,
) -> Result<HttpResponse, actix_web::Error> {
    let department_id = department_id.into_inner();
    let detail = format!("/department/{}", department_id);
    let user = match require_login(&session, &services, &secret, &detail).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    if !services.ratings.can_rate(&user, department_id).await.map_err(e500)? {
        FlashMessage::error(RatingError::NotAllowed.to_string()).send();
        return Ok(see_other(&detail));
    }
    let score = match form.rating.trim().parse::<i32>() {
        Ok(score) => score,
        Err(_) => {
            FlashMessage::error("The rating must be between 1 and 5").send();
            return Ok(see_other(&detail));
        }
    };

    match services
        .ratings
        .create_rating(user.id, department_id, score, form.comment.as_deref())
        .await
    {
        Ok(_) => FlashMessage::success("Thank you for your rating.").send(),
        Err(RatingError::Unexpected(e)) => return Err(e500(e)),
        Err(e) => FlashMessage::error(e.to_string()).send(),
    }
    Ok(see_other(&detail))
}
