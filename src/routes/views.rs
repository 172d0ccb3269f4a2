use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use std::fmt::Write;

use crate::domain::UserRole;

pub fn escape(s: &str) -> String {
    htmlescape::encode_minimal(s)
}

pub fn money(amount: f64) -> String {
    format!("S/ {:.2}", amount)
}

pub fn flash_html(flash_messages: &IncomingFlashMessages) -> String {
    let mut html = String::new();
    for m in flash_messages.iter() {
        // writing to a String cannot fail
        let _ = writeln!(html, "<p><i>{}</i></p>", escape(m.content()));
    }
    html
}

fn navigation(role: UserRole) -> &'static str {
    match role {
        UserRole::Visitor => {
            r#"<a href="/">Catalog</a> | <a href="/login">Login</a> | <a href="/register">Register</a>"#
        }
        UserRole::Tenant => {
            r#"<a href="/">Catalog</a> | <a href="/tenant/dashboard">My dashboard</a> |
            <form action="/logout" method="post" style="display:inline"><button type="submit">Logout</button></form>"#
        }
        UserRole::Admin => {
            r#"<a href="/">Catalog</a> | <a href="/admin/dashboard">Dashboard</a> |
            <a href="/admin/departments">Departments</a> | <a href="/admin/payments">Payments</a> |
            <a href="/admin/reports">Reports</a> |
            <form action="/logout" method="post" style="display:inline"><button type="submit">Logout</button></form>"#
        }
    }
}

/// Wrap `content` in the shared layout. `content` must already be escaped.
pub fn page(
    title: &str,
    role: UserRole,
    flash_messages: &IncomingFlashMessages,
    content: &str,
) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{title}</title>
</head>
<body>
    <nav>{nav}</nav>
    {flash}
    <h1>{title}</h1>
    {content}
</body>
</html>"#,
            title = escape(title),
            nav = navigation(role),
            flash = flash_html(flash_messages),
            content = content,
        ))
}

/// `<option>` list with `selected` on the current value.
pub fn options<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>, selected: &str) -> String {
    values
        .into_iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                value,
                if value == selected { " selected" } else { "" },
                escape(label)
            )
        })
        .collect()
}

pub fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}
