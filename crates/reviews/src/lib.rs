//! `tindahan-reviews` — product review records.

pub mod review;

pub use review::Review;
