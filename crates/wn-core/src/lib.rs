//! wn-core: stable foundation for waternet.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact dense indices for network objects)
//! - geo (planar/geographic coordinates and polyline lengths)
//! - error (shared error types)

pub mod error;
pub mod geo;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{WnError, WnResult};
pub use geo::*;
pub use ids::*;
pub use numeric::*;
pub use units::*;
