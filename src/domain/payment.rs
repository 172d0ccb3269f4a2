use chrono::{DateTime, Utc};
use serde_aux::field_attributes::deserialize_number_from_string;
use uuid::Uuid;

use crate::domain::RentMonth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("{} is not a valid payment status.", other)),
        }
    }

    /// Only payments waiting for review can be approved or rejected.
    pub fn is_reviewable(&self) -> bool {
        *self == PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    // numeric columns may be returned as strings
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub amount: f64,
    pub status: PaymentStatus,
    pub month: RentMonth,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Amount suggested to a tenant for a given month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentQuote {
    pub month: RentMonth,
    pub monthly_price: f64,
    pub amount: f64,
    pub prorated: bool,
}
