use uuid::Uuid;

use crate::domain::{PaymentStatus, Rating, RatingScore, RatingSummary, User};
use crate::repositories::{PaymentRepository, RatingRepository};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum RatingError {
    #[error("Rating not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Only tenants of this department can rate it")]
    NotAllowed,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for RatingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

fn clean_comment(comment: Option<&str>) -> Option<&str> {
    comment.map(str::trim).filter(|c| !c.is_empty())
}

#[derive(Clone)]
pub struct RatingService {
    ratings: RatingRepository,
    payments: PaymentRepository,
}

impl RatingService {
    pub fn new(ratings: RatingRepository, payments: PaymentRepository) -> Self {
        Self { ratings, payments }
    }

    pub async fn get_department_ratings(&self, department_id: Uuid) -> Result<Vec<Rating>, anyhow::Error> {
        self.ratings.get_by_department(department_id).await
    }

    pub async fn get_user_rating(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
    ) -> Result<Option<Rating>, anyhow::Error> {
        self.ratings
            .get_by_tenant_and_department(tenant_id, department_id)
            .await
    }

    pub async fn get_average_rating(&self, department_id: Uuid) -> Result<Option<f64>, anyhow::Error> {
        self.ratings.get_average(department_id).await
    }

    pub async fn get_rating_count(&self, department_id: Uuid) -> Result<u64, anyhow::Error> {
        self.ratings.get_count(department_id).await
    }

    pub async fn summary(&self, department_id: Uuid) -> Result<RatingSummary, anyhow::Error> {
        let average = self.get_average_rating(department_id).await?;
        let count = self.get_rating_count(department_id).await?;
        Ok(RatingSummary { average, count })
    }

    /// Tenants living in the unit, or who had a payment for it approved.
    pub async fn can_rate(&self, user: &User, department_id: Uuid) -> Result<bool, anyhow::Error> {
        if !user.is_tenant() {
            return Ok(false);
        }
        if user.department_id == Some(department_id) {
            return Ok(true);
        }
        let approved = self
            .payments
            .get_by_tenant_and_status(user.id, PaymentStatus::Approved)
            .await?;
        Ok(approved.iter().any(|p| p.department_id == department_id))
    }

    /// A second rating by the same tenant replaces the first one.
    #[tracing::instrument(name = "Rate department", skip(self, comment))]
    pub async fn create_rating(
        &self,
        tenant_id: Uuid,
        department_id: Uuid,
        score: i32,
        comment: Option<&str>,
    ) -> Result<Rating, RatingError> {
        let score = RatingScore::parse(score).map_err(RatingError::Validation)?;
        let comment = clean_comment(comment);
        match self
            .ratings
            .get_by_tenant_and_department(tenant_id, department_id)
            .await?
        {
            Some(existing) => self
                .ratings
                .update(existing.id, score, comment)
                .await?
                .ok_or(RatingError::NotFound),
            None => Ok(self
                .ratings
                .create(tenant_id, department_id, score, comment)
                .await?),
        }
    }

    pub async fn update_rating(
        &self,
        rating_id: Uuid,
        score: i32,
        comment: Option<&str>,
    ) -> Result<Rating, RatingError> {
        let score = RatingScore::parse(score).map_err(RatingError::Validation)?;
        if self.ratings.get_by_id(rating_id).await?.is_none() {
            return Err(RatingError::NotFound);
        }
        self.ratings
            .update(rating_id, score, clean_comment(comment))
            .await?
            .ok_or(RatingError::NotFound)
    }

    pub async fn delete_rating(&self, rating_id: Uuid) -> Result<(), RatingError> {
        if self.ratings.get_by_id(rating_id).await?.is_none() {
            return Err(RatingError::NotFound);
        }
        Ok(self.ratings.delete(rating_id).await?)
    }
}
