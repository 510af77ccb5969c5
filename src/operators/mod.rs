//! Operator sets
//!
//! Derived sets whose recompute is a store-side set operation over already
//! warm children. Operator keys are built from child keys, so arbitrarily
//! nested trees keep deterministic identities.

mod alias;
mod intersection;
mod subtraction;
mod union;

pub use alias::AliasSet;
pub use intersection::IntersectionSet;
pub use subtraction::SubtractionSet;
pub use union::UnionSet;
