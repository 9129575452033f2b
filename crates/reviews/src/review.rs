use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tindahan_core::{DomainError, DomainResult, ProductId, Record, ReviewId, UserId};

/// Review record: one customer's rating of a product.
///
/// The product-side aggregate (mean rating, review count) lives on the
/// product record and is folded in by the service that writes both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author_id: UserId,
    pub author_name: String,
    /// Whole-star rating, 1 through 5.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Review {
    const COLLECTION: &'static str = "reviews";

    fn record_id(&self) -> Uuid {
        self.id.into()
    }
}

impl Review {
    pub fn create(
        id: ReviewId,
        product_id: ProductId,
        author_id: UserId,
        author_name: String,
        rating: u8,
        comment: String,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::validation("rating must be between 1 and 5"));
        }
        if comment.trim().is_empty() {
            return Err(DomainError::validation("review comment cannot be empty"));
        }
        Ok(Self {
            id,
            product_id,
            author_id,
            author_name,
            rating,
            comment,
            created_at,
        })
    }
}
