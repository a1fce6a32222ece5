//! Reliquary Resolve - Pure Resolvers
//!
//! The two pure annotation passes applied to every scanned item record before
//! it reaches the vault engine: spatial-location normalization and canonical
//! icon resolution. No I/O, no storage; the only state is the one-time-built
//! icon index, which is safe to share read-only across concurrent calls.

pub mod catalog;
pub mod icon;
pub mod spatial;

pub use catalog::{CatalogEntry, IconIndex};
pub use icon::{resolve_canonical_icon_filename, IconResolveInput, AMBIGUOUS_ITEM_CODES};
pub use spatial::resolve_spatial_location;
