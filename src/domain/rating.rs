use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct RatingScore(i32);

impl RatingScore {
    pub fn parse(value: i32) -> Result<RatingScore, String> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err("The rating must be between 1 and 5".into())
        }
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub department_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rating {
    pub fn stars(&self) -> String {
        let filled = self.rating.clamp(0, 5) as usize;
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub count: u64,
}
