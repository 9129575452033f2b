use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tindahan_core::{DomainError, DomainResult, OrderId, ProductId, Record, UserId, VariationId};

/// Order status lifecycle.
///
/// ```text
/// Processing -> Shipped -> Delivered            (terminal)
/// Processing -> CancellationRequested -> Cancelled   (terminal)
///                         \-> Processing        (seller rejects)
/// ```
///
/// Wire names match the hosted deployment's stored strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(rename = "Cancellation Requested")]
    CancellationRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    GCash,
    PayMaya,
    #[serde(rename = "COD")]
    Cod,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMethod {
    Standard,
    Pickup,
}

/// Shipping destination captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub mobile_number: String,
    pub street: String,
    pub barangay: String,
    pub city: String,
    pub province: String,
}

/// Snapshot of the variation selected for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationRef {
    pub id: VariationId,
    pub name: String,
}

/// One cart line, denormalized at purchase time and immutable afterwards.
///
/// Prices and names are copied from the catalog so later product edits do
/// not rewrite order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Price charged per unit, in centavos (the variation price when one was
    /// selected).
    pub unit_price: u64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<VariationRef>,
}

impl OrderItem {
    pub fn variation_id(&self) -> Option<VariationId> {
        self.variation.as_ref().map(|v| v.id)
    }
}

/// Checkout input for a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    pub total_amount: u64,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    pub shipping_address: Option<Address>,
}

/// Outcome of an approval attempt; `AlreadyCancelled` lets callers no-op
/// instead of restoring stock twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationApproval {
    Approved,
    AlreadyCancelled,
}

/// Order record: a cart snapshot plus its fulfillment state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub customer_name: String,
    pub items: Vec<OrderItem>,
    /// Total charged at checkout, in centavos.
    pub total_amount: u64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    pub created_at: DateTime<Utc>,
    /// Distinct sellers referenced by the items, derived once at creation.
    pub seller_ids: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl Record for Order {
    const COLLECTION: &'static str = "orders";

    fn record_id(&self) -> Uuid {
        self.id.into()
    }
}

impl Order {
    /// Build the immutable checkout snapshot in status `Processing`.
    ///
    /// Validates the cart before any storage work and derives the distinct
    /// seller set once, so later readers never recompute it.
    pub fn create(id: OrderId, new_order: NewOrder, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if new_order.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        for item in &new_order.items {
            if item.quantity == 0 {
                return Err(DomainError::validation("item quantity must be positive"));
            }
        }

        let mut seller_ids: Vec<UserId> = Vec::new();
        for item in &new_order.items {
            if let Some(seller_id) = item.seller_id {
                if !seller_ids.contains(&seller_id) {
                    seller_ids.push(seller_id);
                }
            }
        }

        Ok(Self {
            id,
            customer_id: new_order.customer_id,
            customer_name: new_order.customer_name,
            items: new_order.items,
            total_amount: new_order.total_amount,
            status: OrderStatus::Processing,
            payment_method: new_order.payment_method,
            delivery_method: new_order.delivery_method,
            shipping_address: new_order.shipping_address,
            created_at,
            seller_ids,
            tracking_number: None,
            courier: None,
            cancellation_reason: None,
        })
    }

    /// Distinct referenced products, in first-seen order.
    pub fn distinct_product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::new();
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }

    /// Items referencing one product (an order may hold several lines for
    /// the same product with different variations).
    pub fn items_for(&self, product_id: ProductId) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(move |item| item.product_id == product_id)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// `Processing -> CancellationRequested`, storing the customer's reason.
    pub fn request_cancellation(&mut self, reason: &str) -> DomainResult<()> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("cancellation reason cannot be empty"));
        }
        if self.status != OrderStatus::Processing {
            return Err(DomainError::invariant(
                "cancellation can only be requested while the order is processing",
            ));
        }
        self.status = OrderStatus::CancellationRequested;
        self.cancellation_reason = Some(reason.trim().to_string());
        Ok(())
    }

    /// `CancellationRequested -> Cancelled`; an already-cancelled order
    /// reports `AlreadyCancelled` so the caller can no-op.
    pub fn approve_cancellation(&mut self) -> DomainResult<CancellationApproval> {
        match self.status {
            OrderStatus::Cancelled => Ok(CancellationApproval::AlreadyCancelled),
            OrderStatus::CancellationRequested => {
                self.status = OrderStatus::Cancelled;
                Ok(CancellationApproval::Approved)
            }
            _ => Err(DomainError::invariant(
                "cancellation was not requested for this order",
            )),
        }
    }

    /// `CancellationRequested -> Processing`. The stored reason is retained
    /// for audit.
    pub fn reject_cancellation(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::CancellationRequested {
            return Err(DomainError::invariant(
                "cancellation was not requested for this order",
            ));
        }
        self.status = OrderStatus::Processing;
        Ok(())
    }

    /// `Processing -> Shipped`, recording the courier handoff.
    pub fn mark_shipped(&mut self, tracking_number: String, courier: String) -> DomainResult<()> {
        if self.status != OrderStatus::Processing {
            return Err(DomainError::invariant("only processing orders can be shipped"));
        }
        self.status = OrderStatus::Shipped;
        self.tracking_number = Some(tracking_number);
        self.courier = Some(courier);
        Ok(())
    }

    /// `Shipped -> Delivered` (terminal).
    pub fn mark_delivered(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Shipped {
            return Err(DomainError::invariant("only shipped orders can be delivered"));
        }
        self.status = OrderStatus::Delivered;
        Ok(())
    }
}
