use chrono::Utc;
use uuid::Uuid;

use tindahan_catalog::{Product, StockPolicy};
use tindahan_core::{DomainError, OrderId};
use tindahan_orders::{CancellationApproval, NewOrder, Order};
use tindahan_store::{DocumentStore, Transaction};

use crate::error::{LedgerError, LedgerResult};

const DEFAULT_COURIER: &str = "J&T Express";

/// The inventory ledger.
///
/// Every unit of stock sold is reserved when the order is created and
/// restored when a cancellation is approved; both directions run as one
/// atomic transaction against the injected store, so stock and order state
/// are never half-updated. Conflicting concurrent commits abort whole
/// transactions (see [`LedgerError::is_retryable`]); retrying is the
/// caller's decision.
pub struct InventoryLedger<S> {
    store: S,
    stock_policy: StockPolicy,
}

impl<S: DocumentStore> InventoryLedger<S> {
    /// Ledger over an injected store handle with the deployed oversell
    /// policy (clamp to zero).
    pub fn new(store: S) -> Self {
        Self::with_policy(store, StockPolicy::default())
    }

    pub fn with_policy(store: S, stock_policy: StockPolicy) -> Self {
        Self {
            store,
            stock_policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an order and reserve its stock as one atomic unit.
    ///
    /// The cart is validated before any store I/O. Each referenced product
    /// is read once; per line, the selected variation's stock (or the flat
    /// stock) is decremented under the configured policy and the aggregate
    /// recomputed. Products missing at reservation time are skipped.
    pub fn create_order(&self, new_order: NewOrder) -> LedgerResult<OrderId> {
        let order = Order::create(OrderId::new(), new_order, Utc::now())?;

        let mut tx = Transaction::new(&self.store);

        let mut reserved: Vec<Product> = Vec::new();
        for product_id in order.distinct_product_ids() {
            let Some(mut product) = tx.get_record::<Product>(product_id.into())? else {
                tracing::warn!(%product_id, order_id = %order.id, "product missing at reservation time, skipping");
                continue;
            };
            for item in order.items_for(product_id) {
                product.reserve(item.variation_id(), item.quantity, self.stock_policy)?;
            }
            reserved.push(product);
        }

        tx.create(&order)?;
        for product in &reserved {
            tx.update(product)?;
        }
        tx.commit()?;

        tracing::info!(
            order_id = %order.id,
            items = order.items.len(),
            products = reserved.len(),
            "order created, stock reserved"
        );
        Ok(order.id)
    }

    /// Record a customer's cancellation request. No stock moves until a
    /// seller approves the request.
    pub fn request_cancellation(&self, order_id: OrderId, reason: &str) -> LedgerResult<()> {
        // Fail before any store I/O on a blank reason.
        if reason.trim().is_empty() {
            return Err(DomainError::validation("cancellation reason cannot be empty").into());
        }

        let mut tx = Transaction::new(&self.store);
        let mut order = self.load_order(&mut tx, order_id)?;
        order.request_cancellation(reason)?;
        tx.update(&order)?;
        tx.commit()?;

        tracing::info!(%order_id, "cancellation requested");
        Ok(())
    }

    /// Approve a requested cancellation: mark the order cancelled and
    /// restore every reserved unit, atomically.
    ///
    /// An already-cancelled order is an idempotent no-op. Products deleted
    /// since purchase are skipped without failing the transaction.
    pub fn approve_cancellation(&self, order_id: OrderId) -> LedgerResult<()> {
        let mut tx = Transaction::new(&self.store);
        let mut order = self.load_order(&mut tx, order_id)?;

        match order.approve_cancellation()? {
            CancellationApproval::AlreadyCancelled => {
                tracing::debug!(%order_id, "order already cancelled");
                return Ok(());
            }
            CancellationApproval::Approved => {}
        }

        // The store contract requires all reads to precede all writes: load
        // every referenced product up front, then stage the writes.
        let mut restored: Vec<Product> = Vec::new();
        for product_id in order.distinct_product_ids() {
            let Some(mut product) = tx.get_record::<Product>(product_id.into())? else {
                tracing::warn!(%product_id, %order_id, "product deleted since purchase, skipping restoration");
                continue;
            };
            for item in order.items_for(product_id) {
                if let Some(variation_id) = item.variation_id() {
                    if product.has_variations() && product.variation(variation_id).is_none() {
                        tracing::warn!(
                            %product_id,
                            %variation_id,
                            quantity = item.quantity,
                            "variation deleted since purchase, units not restored"
                        );
                    }
                }
                product.restore(item.variation_id(), item.quantity);
            }
            restored.push(product);
        }

        tx.update(&order)?;
        for product in &restored {
            tx.update(product)?;
        }
        tx.commit()?;

        tracing::info!(%order_id, products = restored.len(), "cancellation approved, stock restored");
        Ok(())
    }

    /// Reject a requested cancellation, returning the order to `Processing`.
    /// The stored reason stays on the order for audit.
    pub fn reject_cancellation(&self, order_id: OrderId) -> LedgerResult<()> {
        let mut tx = Transaction::new(&self.store);
        let mut order = self.load_order(&mut tx, order_id)?;
        order.reject_cancellation()?;
        tx.update(&order)?;
        tx.commit()?;

        tracing::info!(%order_id, "cancellation rejected");
        Ok(())
    }

    /// Hand the order to a courier: generates a tracking number, stores it
    /// with the courier name and moves the order to `Shipped`.
    ///
    /// Returns the generated tracking number.
    pub fn mark_shipped(&self, order_id: OrderId, courier: Option<&str>) -> LedgerResult<String> {
        let tracking_number = generate_tracking_number();
        let courier = courier.unwrap_or(DEFAULT_COURIER);

        let mut tx = Transaction::new(&self.store);
        let mut order = self.load_order(&mut tx, order_id)?;
        order.mark_shipped(tracking_number.clone(), courier.to_string())?;
        tx.update(&order)?;
        tx.commit()?;

        tracing::info!(%order_id, %tracking_number, courier, "order shipped");
        Ok(tracking_number)
    }

    /// Record delivery of a shipped order (terminal).
    pub fn mark_delivered(&self, order_id: OrderId) -> LedgerResult<()> {
        let mut tx = Transaction::new(&self.store);
        let mut order = self.load_order(&mut tx, order_id)?;
        order.mark_delivered()?;
        tx.update(&order)?;
        tx.commit()?;

        tracing::info!(%order_id, "order delivered");
        Ok(())
    }

    fn load_order(
        &self,
        tx: &mut Transaction<'_, S>,
        order_id: OrderId,
    ) -> LedgerResult<Order> {
        tx.get_record::<Order>(order_id.into())?
            .ok_or_else(|| DomainError::not_found().into())
    }
}

/// 12-digit tracking number with the courier's leading 9.
fn generate_tracking_number() -> String {
    let digits = Uuid::now_v7().as_u128() % 100_000_000_000;
    format!("9{digits:011}")
}
