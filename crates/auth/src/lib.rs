//! Authentication primitives: JWT claims + validation.
//!
//! Authorization for orders (who may move an order through its lifecycle) is
//! decided in the orders domain by comparing the caller to the order's buyer
//! and seller; this crate only establishes *who the caller is*.

pub mod claims;
pub mod jwt;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
