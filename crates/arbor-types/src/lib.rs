//! Foundation types for Arbor, the three-way structural merge engine.
//!
//! This crate provides the identity, lineage, and value types used
//! throughout the Arbor workspace. Every other Arbor crate depends on
//! `arbor-types`.
//!
//! # Key Types
//!
//! - [`NodeId`] — Stable node identity (UUID v7, time-ordered)
//! - [`Lineage`] — Ordered derivation history of a node, oldest first
//! - [`PropertyValue`] — Closed sum type of everything a property can hold
//! - [`ComponentValue`] — Fixed-arity domain values (colors, 2-D points)
//!   merged component-wise rather than atomically
//! - [`MergeConflict`] — An irreconcilable three-way disagreement on one property
//! - [`Node`] — A tree element: identity, lineage, kind tag, property
//!   table, ordered children

pub mod conflict;
pub mod error;
pub mod identity;
pub mod node;
pub mod value;

pub use conflict::MergeConflict;
pub use error::TypeError;
pub use identity::{Lineage, NodeId};
pub use node::{Node, PropertySlot, CHILDREN_PROPERTY};
pub use value::{ComponentKind, ComponentValue, OpaqueValue, PropertyMap, PropertyValue};
