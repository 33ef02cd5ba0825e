//! Catalog lookup contract.
//!
//! The order engine does not own product data. It consumes a read-only view
//! of the catalog: current price, stock, active flag, and owning seller.

pub mod product;

pub use product::{CatalogError, CatalogLookup, ProductId, ProductSnapshot};
