use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use crate::backend::{BackendClient, Order, Query};
use crate::domain::{Rating, RatingScore};

const TABLE: &str = "ratings";

#[derive(Clone)]
pub struct RatingRepository {
    client: BackendClient,
}

#[derive(serde::Serialize)]
struct NewRatingRow<'a> {
    tenant_id: Uuid,
    department_id: Uuid,
    rating: RatingScore,
    comment: Option<&'a str>,
}

#[derive(serde::Deserialize)]
struct ScoreRow {
    rating: i32,
}

fn average(scores: &[ScoreRow]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let total: i64 = scores.iter().map(|s| i64::from(s.rating)).sum();
    Some(total as f64 / scores.len() as f64)
}

impl RatingRepository {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(name = "Get rating by id", skip(self))]
    pub async fn get_by_id(&self, rating_id: Uuid) -> Result<Option<Rating>, anyhow::Error> {
        self.client
            .select_one(TABLE, &Query::new().eq("id", rating_id))
            .await
            .context("Failed to fetch a rating by id")
    }

    #[tracing::instrument(name = "Get ratings of a department", skip(self))]
    pub async fn get_by_department(&self, department_id: Uuid) -> Result<Vec<Rating>, anyhow::Error> {
        let query = Query::new()
            .eq("department_id", department_id)
            .order("created_at", Order::Desc);
        self.client
            .select(TABLE, &query)
            .await
            .context("Failed to fetch the ratings of a department")
    }

    #[tracing::instrument(name = "Get rating of a tenant", skip(self))]
    pub async fn get_by_tenant_and_department(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
    ) -> Result<Option<Rating>, anyhow::Error> {
        let query = Query::new()
            .eq("tenant_id", tenant_id)
            .eq("department_id", department_id);
        self.client
            .select_one(TABLE, &query)
            .await
            .context("Failed to fetch the rating of a tenant")
    }

    /// `None` when the department has not been rated yet.
    #[tracing::instrument(name = "Get average rating", skip(self))]
    pub async fn get_average(&self, department_id: Uuid) -> Result<Option<f64>, anyhow::Error> {
        let scores: Vec<ScoreRow> = self
            .client
            .select(TABLE, &Query::new().eq("department_id", department_id))
            .await
            .context("Failed to fetch the scores of a department")?;
        Ok(average(&scores))
    }

    #[tracing::instrument(name = "Count ratings", skip(self))]
    pub async fn get_count(&self, department_id: Uuid) -> Result<u64, anyhow::Error> {
        self.client
            .count(TABLE, &Query::new().eq("department_id", department_id))
            .await
            .context("Failed to count the ratings of a department")
    }

    #[tracing::instrument(name = "Create rating", skip(self, comment))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        score: RatingScore,
        comment: Option<&str>,
    ) -> Result<Rating, anyhow::Error> {
        let row = NewRatingRow {
            tenant_id,
            department_id,
            rating: score,
            comment,
        };
        self.client
            .insert(TABLE, &row)
            .await
            .context("Failed to insert a new rating")
    }

    #[tracing::instrument(name = "Update rating", skip(self, comment))]
    pub async fn update(
        &self,
        rating_id: Uuid,
        score: RatingScore,
        comment: Option<&str>,
    ) -> Result<Option<Rating>, anyhow::Error> {
        let rows: Vec<Rating> = self
            .client
            .update(
                TABLE,
                &Query::new().eq("id", rating_id),
                &serde_json::json!({
                    "rating": score,
                    "comment": comment,
                    "updated_at": Utc::now(),
                }),
            )
            .await
            .context("Failed to update a rating")?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Delete rating", skip(self))]
    pub async fn delete(&self, rating_id: Uuid) -> Result<(), anyhow::Error> {
        self.client
            .delete(TABLE, &Query::new().eq("id", rating_id))
            .await
            .context("Failed to delete a rating")
    }
}
