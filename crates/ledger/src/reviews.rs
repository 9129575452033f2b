use chrono::Utc;

use tindahan_catalog::Product;
use tindahan_core::{ProductId, ReviewId, UserId};
use tindahan_reviews::Review;
use tindahan_store::{DocumentStore, Transaction};

use crate::error::LedgerResult;

/// Review posting: writes the review document and the product's rating
/// aggregate in one atomic unit so listings never show a count/mean pair
/// from two different moments.
pub struct ReviewService<S> {
    store: S,
}

impl<S: DocumentStore> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a review and fold it into the product's rating aggregate.
    ///
    /// A product deleted since purchase still gets the review recorded; only
    /// the aggregate update is skipped.
    pub fn post_review(
        &self,
        product_id: ProductId,
        author_id: UserId,
        author_name: &str,
        rating: u8,
        comment: &str,
    ) -> LedgerResult<ReviewId> {
        let review = Review::create(
            ReviewId::new(),
            product_id,
            author_id,
            author_name.to_string(),
            rating,
            comment.to_string(),
            Utc::now(),
        )?;

        let mut tx = Transaction::new(&self.store);
        let product = tx.get_record::<Product>(product_id.into())?;

        tx.create(&review)?;
        match product {
            Some(mut product) => {
                product.record_review(rating);
                tx.update(&product)?;
            }
            None => {
                tracing::warn!(%product_id, "product missing, review recorded without rating aggregate");
            }
        }
        tx.commit()?;

        tracing::info!(review_id = %review.id, %product_id, rating, "review posted");
        Ok(review.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tindahan_catalog::{Category, NewProduct};
    use tindahan_core::DomainError;
    use tindahan_store::{DocKey, InMemoryDocumentStore};

    use crate::error::LedgerError;

    fn service() -> (ReviewService<Arc<InMemoryDocumentStore>>, Arc<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        (ReviewService::new(Arc::clone(&store)), store)
    }

    fn seed_product(store: &InMemoryDocumentStore) -> Product {
        let product = Product::create(
            ProductId::new(),
            NewProduct {
                seller_id: Some(UserId::new()),
                name: "Bagnet".to_string(),
                description: String::new(),
                category: Category::Delicacy,
                price: 45_000,
                image: None,
                stock: 20,
                variations: Vec::new(),
            },
        )
        .unwrap();

        let mut tx = Transaction::new(store);
        tx.create(&product).unwrap();
        tx.commit().unwrap();
        product
    }

    fn load_product(store: &InMemoryDocumentStore, id: ProductId) -> Product {
        let doc = store.get(&DocKey::of::<Product>(id.into())).unwrap().unwrap();
        serde_json::from_value(doc.data).unwrap()
    }

    fn load_review(store: &InMemoryDocumentStore, id: ReviewId) -> Review {
        let doc = store.get(&DocKey::of::<Review>(id.into())).unwrap().unwrap();
        serde_json::from_value(doc.data).unwrap()
    }

    #[test]
    fn post_review_writes_review_and_aggregate_together() {
        let (service, store) = service();
        let product = seed_product(&store);

        let review_id = service
            .post_review(product.id, UserId::new(), "Maria", 4, "Crisp and rich")
            .unwrap();

        let review = load_review(&store, review_id);
        assert_eq!(review.product_id, product.id);
        assert_eq!(review.rating, 4);

        let stored = load_product(&store, product.id);
        assert_eq!(stored.review_count, 1);
        assert_eq!(stored.rating, 4.0);
    }

    #[test]
    fn ratings_accumulate_to_one_decimal() {
        let (service, store) = service();
        let product = seed_product(&store);

        service
            .post_review(product.id, UserId::new(), "Maria", 4, "Good")
            .unwrap();
        service
            .post_review(product.id, UserId::new(), "Juan", 5, "Great")
            .unwrap();
        service
            .post_review(product.id, UserId::new(), "Ana", 5, "Perfect")
            .unwrap();

        let stored = load_product(&store, product.id);
        assert_eq!(stored.review_count, 3);
        assert_eq!(stored.rating, 4.7);
    }

    #[test]
    fn review_survives_a_deleted_product() {
        let (service, store) = service();
        let product = seed_product(&store);

        let mut tx = Transaction::new(store.as_ref());
        tx.get(DocKey::of::<Product>(product.id.into())).unwrap();
        tx.delete(DocKey::of::<Product>(product.id.into())).unwrap();
        tx.commit().unwrap();

        let review_id = service
            .post_review(product.id, UserId::new(), "Maria", 3, "Arrived late")
            .unwrap();

        assert_eq!(load_review(&store, review_id).rating, 3);
        assert!(store.get(&DocKey::of::<Product>(product.id.into())).unwrap().is_none());
    }

    #[test]
    fn invalid_ratings_fail_before_any_write() {
        let (service, store) = service();
        let product = seed_product(&store);
        let documents_before = store.len();

        let err = service
            .post_review(product.id, UserId::new(), "Maria", 0, "Bad")
            .unwrap_err();

        assert!(matches!(err, LedgerError::Domain(DomainError::Validation(_))));
        assert_eq!(store.len(), documents_before);
    }
}
