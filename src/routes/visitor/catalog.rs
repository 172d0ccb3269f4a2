use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use std::fmt::Write;

use crate::domain::{CatalogQuery, Department, DepartmentFilters};
use crate::routes::views::{checked, escape, money, page};
use crate::services::Services;
use crate::session_state::TypedSession;
use crate::utils::e500;

fn filter_form(query: &CatalogQuery, filters: &DepartmentFilters) -> String {
    let echo = |value: &Option<String>| escape(value.as_deref().unwrap_or(""));
    format!(
        r#"<form action="/" method="get">
        <label><input type="checkbox" name="has_terrace" value="1"{}> Terrace</label>
        <label><input type="checkbox" name="has_balcony" value="1"{}> Balcony</label>
        <label><input type="checkbox" name="sea_view" value="1"{}> Sea view</label>
        <label><input type="checkbox" name="parking" value="1"{}> Parking</label>
        <label><input type="checkbox" name="furnished" value="1"{}> Furnished</label>
        <label>Min price <input type="number" step="0.01" name="min_price" value="{}"></label>
        <label>Max price <input type="number" step="0.01" name="max_price" value="{}"></label>
        <label>Min rooms <input type="number" name="min_rooms" value="{}"></label>
        <label>Max rooms <input type="number" name="max_rooms" value="{}"></label>
        <button type="submit">Filter</button> <a href="/">Clear</a>
    </form>"#,
        checked(filters.has_terrace),
        checked(filters.has_balcony),
        checked(filters.sea_view),
        checked(filters.parking),
        checked(filters.furnished),
        echo(&query.min_price),
        echo(&query.max_price),
        echo(&query.min_rooms),
        echo(&query.max_rooms),
    )
}

pub fn department_card(department: &Department) -> String {
    let image = department
        .image_url
        .as_deref()
        .map(|url| format!(r#"<img src="{}" alt="" width="240">"#, escape(url)))
        .unwrap_or_default();
    let rooms = department
        .rooms
        .map(|r| format!("{} rooms", r))
        .unwrap_or_default();
    format!(
        r#"<li>{image}
        <a href="/department/{id}">{title}</a> - {address} - {price} {rooms}
        <small>{features}</small></li>"#,
        image = image,
        id = department.id,
        title = escape(&department.title),
        address = escape(&department.address),
        price = money(department.price),
        rooms = rooms,
        features = department.features().join(", "),
    )
}

#[tracing::instrument(name = "Browse catalog", skip(query, services, session, flash_messages))]
pub async fn catalog(
    query: web::Query<CatalogQuery>,
    services: web::Data<Services>,
    session: TypedSession,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let query = query.into_inner();
    let filters = DepartmentFilters::from_query(&query);
    let departments = services
        .departments
        .get_all_departments(None, true, Some(&filters))
        .await
        .map_err(e500)?;

    let mut content = filter_form(&query, &filters);
    if departments.is_empty() {
        content.push_str("<p>No departments match your search.</p>");
    } else {
        content.push_str("<ul>");
        for department in &departments {
            let _ = write!(content, "{}", department_card(department));
        }
        content.push_str("</ul>");
    }

    let role = session.get_user_role().map_err(e500)?;
    Ok(page("Available departments", role, &flash_messages, &content))
}
