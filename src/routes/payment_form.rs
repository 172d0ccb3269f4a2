use actix_multipart::Multipart;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{Department, Payment, RentMonth};
use crate::routes::uploads::MultipartForm;
use crate::routes::views::{escape, money};
use crate::services::{PaymentError, Services};
use crate::utils::e500;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The rent form shared by the visitor and tenant flows, posting to `action`.
pub fn render(department: &Department, action: &str, max_receipt_bytes: usize) -> String {
    let month = RentMonth::current(today());
    format!(
        r#"<p>{title}, {address}. Monthly rent: {price}</p>
    <form action="{action}" method="post" enctype="multipart/form-data">
        <label>Month
            <input type="month" name="month" value="{month}" required>
        </label>
        <label>Move-in date (first month only)
            <input type="date" name="move_in">
        </label>
        <label>Amount
            <input type="number" name="amount" step="0.01" min="0.01" placeholder="{amount:.2}">
        </label>
        <label>Notes
            <textarea name="notes"></textarea>
        </label>
        <label>Receipt (max {limit} MB)
            <input type="file" name="receipt" required>
        </label>
        <button type="submit">Register payment</button>
    </form>
    <p>Leave the amount empty to pay the monthly rent, prorated from the move-in date when given.</p>"#,
        title = escape(&department.title),
        address = escape(&department.address),
        price = money(department.price),
        action = escape(action),
        month = month,
        amount = department.price,
        limit = max_receipt_bytes / (1024 * 1024),
    )
}

/// `Ok(Err(message))` when the submission was refused for a reason the user can fix.
pub async fn submit(
    services: &Services,
    tenant_id: Uuid,
    department: &Department,
    payload: Multipart,
    max_receipt_bytes: usize,
) -> Result<Result<Payment, String>, actix_web::Error> {
    let mut form = match MultipartForm::read(payload, max_receipt_bytes).await {
        Ok(form) => form,
        Err(e) => return Ok(Err(e.to_string())),
    };
    let receipt = match form.take_file("receipt") {
        Some(receipt) => receipt,
        None => return Ok(Err("You must attach the payment receipt".into())),
    };
    let raw_month = match form.text("month") {
        Some(month) => month.to_string(),
        None => return Ok(Err("The month is required".into())),
    };

    let amount = match amount_due(&form, department, &raw_month) {
        Ok(amount) => amount,
        Err(message) => return Ok(Err(message)),
    };

    match services
        .payments
        .create_payment_with_receipt(
            tenant_id,
            department.id,
            amount,
            &raw_month,
            form.text("notes"),
            today(),
            receipt.content,
            &receipt.file_name,
        )
        .await
    {
        Ok(payment) => Ok(Ok(payment)),
        Err(PaymentError::Unexpected(e)) => Err(e500(e)),
        Err(e) => Ok(Err(e.to_string())),
    }
}

// An explicit amount wins, otherwise the quote for the month.
fn amount_due(form: &MultipartForm, department: &Department, raw_month: &str) -> Result<f64, String> {
    if let Some(amount) = form.number::<f64>("amount")? {
        return Ok(amount);
    }
    let month = RentMonth::parse(raw_month)?;
    let move_in = match form.text("move_in") {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| format!("'{}' is not a valid move-in date", raw))?,
        ),
        None => None,
    };
    crate::services::quote(department, month, move_in)
        .map(|quote| quote.amount)
        .map_err(|e| e.to_string())
}
