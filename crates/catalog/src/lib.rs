//! `tindahan-catalog` — product and variation records with their stock
//! arithmetic (reservation, restoration, aggregate recomputation).

pub mod product;

pub use product::{Category, NewProduct, Product, StockPolicy, Variation};
