use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tindahan_core::{DomainError, DomainResult, ProductId, Record, UserId, VariationId};

/// Product category as exposed by the storefront.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Weaving,
    Pottery,
    Delicacy,
    Accessory,
}

/// What a reservation does when it asks for more stock than is available.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Decrement down to zero and absorb the difference (deployed behavior).
    #[default]
    ClampToZero,
    /// Refuse the reservation before anything is written.
    RejectOversell,
}

/// A purchasable option of a product with its own price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub id: VariationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Price in centavos.
    pub price: u64,
    pub stock: u32,
}

/// Seller input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub seller_id: Option<UserId>,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: u64,
    pub image: Option<String>,
    pub stock: u32,
    pub variations: Vec<Variation>,
}

/// Catalog record: one sellable product.
///
/// `stock` is the flat count for variation-less products and the
/// variation-stock sum otherwise; every mutation re-establishes that
/// equality via [`Product::normalize_stock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<UserId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    /// Base price in centavos; a selected variation's price overrides it.
    pub price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Mean review rating, kept to one decimal.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<Variation>,
}

impl Record for Product {
    const COLLECTION: &'static str = "products";

    fn record_id(&self) -> Uuid {
        self.id.into()
    }
}

impl Product {
    /// Validate and normalize a seller's new catalog entry.
    pub fn create(id: ProductId, new_product: NewProduct) -> DomainResult<Self> {
        let mut product = Self {
            id,
            seller_id: new_product.seller_id,
            name: new_product.name,
            description: new_product.description,
            category: new_product.category,
            price: new_product.price,
            image: new_product.image,
            rating: 0.0,
            review_count: 0,
            stock: new_product.stock,
            variations: new_product.variations,
        };
        product.validate()?;
        product.normalize_stock();
        Ok(product)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        for variation in &self.variations {
            if variation.name.trim().is_empty() {
                return Err(DomainError::validation("variation name cannot be empty"));
            }
        }
        Ok(())
    }

    pub fn has_variations(&self) -> bool {
        !self.variations.is_empty()
    }

    pub fn variation(&self, id: VariationId) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == id)
    }

    fn variation_mut(&mut self, id: VariationId) -> Option<&mut Variation> {
        self.variations.iter_mut().find(|v| v.id == id)
    }

    /// Re-establish `stock == sum(variation stocks)` for products with
    /// variations. Variation-less products keep their flat count.
    pub fn normalize_stock(&mut self) {
        if self.has_variations() {
            self.stock = self.variations.iter().map(|v| v.stock).sum();
        }
    }

    /// Take `quantity` units out of stock for a sale.
    ///
    /// A selected variation that no longer exists reserves nothing: the cart
    /// snapshot is stale and there is no stock bucket to take from.
    pub fn reserve(
        &mut self,
        variation_id: Option<VariationId>,
        quantity: u32,
        policy: StockPolicy,
    ) -> DomainResult<()> {
        match variation_id {
            Some(id) if self.has_variations() => {
                if let Some(variation) = self.variation_mut(id) {
                    variation.stock = take(variation.stock, quantity, policy)?;
                }
            }
            _ => {
                self.stock = take(self.stock, quantity, policy)?;
            }
        }
        self.normalize_stock();
        Ok(())
    }

    /// Put `quantity` units back after a cancellation is approved.
    ///
    /// Units of a variation deleted since purchase have no bucket to return
    /// to; the aggregate recomputation drops them.
    pub fn restore(&mut self, variation_id: Option<VariationId>, quantity: u32) {
        match variation_id {
            Some(id) if self.has_variations() => {
                if let Some(variation) = self.variation_mut(id) {
                    variation.stock = variation.stock.saturating_add(quantity);
                }
            }
            _ => {
                self.stock = self.stock.saturating_add(quantity);
            }
        }
        self.normalize_stock();
    }

    /// Fold one new review rating into the aggregate, rounded to one decimal.
    pub fn record_review(&mut self, rating: u8) {
        let total = self.rating * f64::from(self.review_count) + f64::from(rating);
        self.review_count += 1;
        self.rating = (total / f64::from(self.review_count) * 10.0).round() / 10.0;
    }
}

fn take(available: u32, requested: u32, policy: StockPolicy) -> DomainResult<u32> {
    match policy {
        StockPolicy::ClampToZero => Ok(available.saturating_sub(requested)),
        StockPolicy::RejectOversell if requested > available => Err(DomainError::invariant(
            format!("insufficient stock: requested {requested}, available {available}"),
        )),
        StockPolicy::RejectOversell => Ok(available - requested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variation(name: &str, stock: u32) -> Variation {
        Variation {
            id: VariationId::new(),
            name: name.to_string(),
            image: None,
            price: 25_000,
            stock,
        }
    }

    fn product_with_variations(variations: Vec<Variation>) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                seller_id: Some(UserId::new()),
                name: "Inabel blanket".to_string(),
                description: "Handwoven".to_string(),
                category: Category::Weaving,
                price: 25_000,
                image: None,
                stock: 0,
                variations,
            },
        )
        .unwrap()
    }

    fn flat_product(stock: u32) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                seller_id: None,
                name: "Burnay jar".to_string(),
                description: String::new(),
                category: Category::Pottery,
                price: 40_000,
                image: None,
                stock,
                variations: Vec::new(),
            },
        )
        .unwrap()
    }

    #[test]
    fn create_normalizes_aggregate_from_variations() {
        let product = product_with_variations(vec![variation("Blue", 4), variation("Red", 6)]);
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn create_rejects_blank_name() {
        let err = Product::create(
            ProductId::new(),
            NewProduct {
                seller_id: None,
                name: "  ".to_string(),
                description: String::new(),
                category: Category::Delicacy,
                price: 100,
                image: None,
                stock: 1,
                variations: Vec::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn reserve_decrements_variation_and_aggregate() {
        let mut product = product_with_variations(vec![variation("Blue", 10)]);
        let id = product.variations[0].id;

        product.reserve(Some(id), 3, StockPolicy::ClampToZero).unwrap();

        assert_eq!(product.variations[0].stock, 7);
        assert_eq!(product.stock, 7);
    }

    #[test]
    fn reserve_decrements_flat_stock() {
        let mut product = flat_product(5);
        product.reserve(None, 2, StockPolicy::ClampToZero).unwrap();
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn reserve_clamps_at_zero() {
        let mut product = product_with_variations(vec![variation("Blue", 2)]);
        let id = product.variations[0].id;

        product.reserve(Some(id), 5, StockPolicy::ClampToZero).unwrap();

        assert_eq!(product.variations[0].stock, 0);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn reject_oversell_fails_and_leaves_stock_untouched() {
        let mut product = product_with_variations(vec![variation("Blue", 2)]);
        let id = product.variations[0].id;

        let err = product
            .reserve(Some(id), 5, StockPolicy::RejectOversell)
            .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(product.variations[0].stock, 2);
        assert_eq!(product.stock, 2);
    }

    #[test]
    fn reserve_on_deleted_variation_changes_nothing() {
        let mut product = product_with_variations(vec![variation("Blue", 4)]);

        product
            .reserve(Some(VariationId::new()), 3, StockPolicy::ClampToZero)
            .unwrap();

        assert_eq!(product.variations[0].stock, 4);
        assert_eq!(product.stock, 4);
    }

    #[test]
    fn restore_adds_back_to_variation_and_aggregate() {
        let mut product = product_with_variations(vec![variation("Blue", 7)]);
        let id = product.variations[0].id;

        product.restore(Some(id), 3);

        assert_eq!(product.variations[0].stock, 10);
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn restore_to_deleted_variation_drops_units() {
        let mut product = product_with_variations(vec![variation("Blue", 7)]);

        product.restore(Some(VariationId::new()), 3);

        // Nowhere to put the units back; the aggregate still matches the sum.
        assert_eq!(product.stock, 7);
    }

    #[test]
    fn restore_flat_stock() {
        let mut product = flat_product(0);
        product.restore(None, 4);
        assert_eq!(product.stock, 4);
    }

    #[test]
    fn record_review_updates_weighted_mean_to_one_decimal() {
        let mut product = flat_product(1);
        product.record_review(4);
        assert_eq!(product.rating, 4.0);
        assert_eq!(product.review_count, 1);

        product.record_review(5);
        assert_eq!(product.rating, 4.5);

        product.record_review(5);
        // (4 + 5 + 5) / 3 = 4.666... -> 4.7
        assert_eq!(product.rating, 4.7);
        assert_eq!(product.review_count, 3);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: aggregate stock always equals the variation sum after
            /// any interleaving of reservations and restorations.
            #[test]
            fn aggregate_equals_variation_sum(
                stocks in prop::collection::vec(0u32..50, 1..6),
                ops in prop::collection::vec((0usize..6, 1u32..20, any::<bool>()), 0..32)
            ) {
                let mut product = product_with_variations(
                    stocks.iter().map(|s| variation("v", *s)).collect(),
                );

                for (index, quantity, is_reserve) in ops {
                    let id = product.variations[index % product.variations.len()].id;
                    if is_reserve {
                        product.reserve(Some(id), quantity, StockPolicy::ClampToZero).unwrap();
                    } else {
                        product.restore(Some(id), quantity);
                    }
                    let sum: u32 = product.variations.iter().map(|v| v.stock).sum();
                    prop_assert_eq!(product.stock, sum);
                }
            }

            /// Property: a clamped reservation never increases stock and never
            /// leaves more reserved than was available.
            #[test]
            fn clamped_reserve_never_underflows(
                available in 0u32..100,
                requested in 0u32..200
            ) {
                let mut product = flat_product(available);
                product.reserve(None, requested, StockPolicy::ClampToZero).unwrap();
                prop_assert!(product.stock <= available);
                prop_assert_eq!(product.stock, available.saturating_sub(requested));
            }
        }
    }
}
