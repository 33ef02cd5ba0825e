//! `tradepost-orders` — the order lifecycle engine.
//!
//! Owns the order aggregate and its status state machine, the creation-time
//! validator that collapses a multi-item purchase into a single-seller
//! transaction, the persistence contract, and the orchestrating service.

pub mod error;
pub mod order;
pub mod service;
pub mod store;
pub mod validator;

pub use error::{InvalidItems, OrderError};
pub use order::{Actor, Order, OrderId, OrderItem, OrderItemId, OrderStatus};
pub use service::OrderService;
pub use store::{OrderStore, Pagination};
pub use validator::{InvalidItem, ItemRequest, OrderValidator, ValidItem, ValidationResult};
