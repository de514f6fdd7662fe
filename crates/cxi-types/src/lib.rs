//! Foundation types for cxi, the export ingester.
//!
//! This crate provides the identifier, kind and property types shared by the
//! range, store and decoder crates. Every other cxi crate depends on
//! `cxi-types`.
//!
//! # Key Types
//!
//! - [`EntityId`] -- numeric id or opaque string key of a decoded entity
//! - [`EntityKind`] -- the fixed set of decodable object classes
//! - [`PropertyValue`] -- tagged union of the values a property can hold
//! - [`PropertyRecord`] -- ordered key→value bag, one per persisted entity

pub mod error;
pub mod id;
pub mod kind;
pub mod record;
pub mod temporal;
pub mod value;

pub use error::TypeError;
pub use id::{EntityId, IdShape};
pub use kind::EntityKind;
pub use record::PropertyRecord;
pub use temporal::parse_export_date;
pub use value::PropertyValue;
