use crate::client::ApiClient;
use crate::domain::review::{CreateReviewDto, Review, ReviewPage, ReviewQuery, UpdateReviewDto, is_allowed_rating};
use crate::error::{ApiError, Result};
use serde_json::Value;

pub const REVIEWS_PATH: &str = "/admin/reviews";

/// Admin moderation of product reviews.
#[derive(Debug, Clone)]
pub struct ReviewService {
    client: ApiClient,
}

impl ReviewService {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list(&self, query: &ReviewQuery) -> Result<ReviewPage> {
        self.client.get(REVIEWS_PATH).query_params(query).send().await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_by_id(&self, id: i64, include_deleted: bool) -> Result<Review> {
        let mut request = self.client.get(format!("{REVIEWS_PATH}/{id}"));
        if include_deleted {
            request = request.query("includeDeleted", true);
        }
        request.send().await
    }

    /// # Errors
    /// Fails with `Encode`, without sending, when the rating is not a half-star step.
    #[tracing::instrument(skip(self, dto), fields(rating = dto.rating), err(level = "warn"))]
    pub async fn create(&self, dto: &CreateReviewDto) -> Result<Review> {
        check_rating(dto.rating)?;
        self.client.post(REVIEWS_PATH).json(dto).send().await
    }

    #[tracing::instrument(skip(self, dto), err(level = "warn"))]
    pub async fn update(&self, id: i64, dto: &UpdateReviewDto) -> Result<Review> {
        if let Some(rating) = dto.rating {
            check_rating(rating)?;
        }
        self.client.patch(format!("{REVIEWS_PATH}/{id}")).json(dto).send().await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove(&self, id: i64) -> Result<()> {
        self.client.delete(format!("{REVIEWS_PATH}/{id}")).send::<Value>().await.map(drop)
    }
}

fn check_rating(rating: f64) -> Result<()> {
    if is_allowed_rating(rating) {
        Ok(())
    } else {
        Err(ApiError::Encode(format!("rating {rating} is not between 0.5 and 5 in half steps")))
    }
}
