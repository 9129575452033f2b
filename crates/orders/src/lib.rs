//! `tindahan-orders` — order records, the order status state machine and
//! checkout-time validation.

pub mod order;

pub use order::{
    Address, CancellationApproval, DeliveryMethod, NewOrder, Order, OrderItem, OrderStatus,
    PaymentMethod, VariationRef,
};
