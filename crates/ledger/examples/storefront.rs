//! End-to-end walk through the storefront services against the in-memory
//! store: seed a product, sell it, cancel the sale, leave a review.
//!
//! Run with `RUST_LOG=debug` for per-operation detail.

use std::sync::Arc;

use tindahan_catalog::{Category, NewProduct, Variation};
use tindahan_core::{UserId, VariationId};
use tindahan_ledger::{CatalogService, InventoryLedger, LedgerError, ReviewService};
use tindahan_orders::{DeliveryMethod, NewOrder, OrderItem, PaymentMethod, VariationRef};
use tindahan_store::InMemoryDocumentStore;

fn main() -> Result<(), LedgerError> {
    tindahan_observability::init();

    let store = Arc::new(InMemoryDocumentStore::new());
    let catalog = CatalogService::new(Arc::clone(&store));
    let ledger = InventoryLedger::new(Arc::clone(&store));
    let reviews = ReviewService::new(Arc::clone(&store));

    let seller_id = UserId::new();
    let variation = Variation {
        id: VariationId::new(),
        name: "Indigo".to_string(),
        image: None,
        price: 25_000,
        stock: 10,
    };
    let product_id = catalog.add_product(NewProduct {
        seller_id: Some(seller_id),
        name: "Inabel blanket".to_string(),
        description: "Handwoven in Ilocos".to_string(),
        category: Category::Weaving,
        price: 25_000,
        image: None,
        stock: 0,
        variations: vec![variation.clone()],
    })?;

    let customer_id = UserId::new();
    let order_id = ledger.create_order(NewOrder {
        customer_id,
        customer_name: "Maria".to_string(),
        items: vec![OrderItem {
            product_id,
            name: "Inabel blanket".to_string(),
            image: None,
            unit_price: variation.price,
            quantity: 3,
            seller_id: Some(seller_id),
            variation: Some(VariationRef {
                id: variation.id,
                name: variation.name.clone(),
            }),
        }],
        total_amount: 3 * variation.price,
        payment_method: PaymentMethod::GCash,
        delivery_method: DeliveryMethod::Standard,
        shipping_address: None,
    })?;

    ledger.request_cancellation(order_id, "wrong color")?;
    ledger.approve_cancellation(order_id)?;

    reviews.post_review(product_id, customer_id, "Maria", 5, "Fast refund, lovely shop")?;

    Ok(())
}
