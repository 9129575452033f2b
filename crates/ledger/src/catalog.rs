use tindahan_catalog::{NewProduct, Product};
use tindahan_core::{DomainError, ProductId};
use tindahan_store::{DocKey, DocumentStore, Transaction};

use crate::error::LedgerResult;

/// Seller catalog maintenance.
///
/// Edits go through the same store contract as the ledger so the
/// aggregate-stock invariant survives them; a seller can change variation
/// stocks but never publish a product whose aggregate disagrees with the
/// variation sum.
pub struct CatalogService<S> {
    store: S,
}

impl<S: DocumentStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate, normalize aggregate stock and create the product document.
    pub fn add_product(&self, new_product: NewProduct) -> LedgerResult<ProductId> {
        let product = Product::create(ProductId::new(), new_product)?;

        let mut tx = Transaction::new(&self.store);
        tx.create(&product)?;
        tx.commit()?;

        tracing::info!(product_id = %product.id, "product added");
        Ok(product.id)
    }

    /// Replace a product document with a seller's edit.
    ///
    /// The aggregate stock is re-normalized before the guarded write;
    /// editing a product that vanished is `NotFound`.
    pub fn update_product(&self, mut product: Product) -> LedgerResult<()> {
        product.validate()?;
        product.normalize_stock();

        let mut tx = Transaction::new(&self.store);
        if tx.get(DocKey::of::<Product>(product.id.into()))?.is_none() {
            return Err(DomainError::not_found().into());
        }
        tx.update(&product)?;
        tx.commit()?;

        tracing::info!(product_id = %product.id, "product updated");
        Ok(())
    }

    /// Remove a product. Removing an already-absent product is a no-op
    /// success.
    pub fn remove_product(&self, product_id: ProductId) -> LedgerResult<()> {
        let key = DocKey::of::<Product>(product_id.into());

        let mut tx = Transaction::new(&self.store);
        if tx.get(key)?.is_none() {
            return Ok(());
        }
        tx.delete(key)?;
        tx.commit()?;

        tracing::info!(%product_id, "product removed");
        Ok(())
    }
}
