//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - two value
/// objects with the same attribute values are the same value. An order line
/// (`product, quantity, unit price`) is a value object; the order that owns
/// it is an entity with identity.
///
/// To "modify" a value object, construct a new one. This keeps values safe to
/// share across threads and predictable in tests.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
