//! Domain types for CorrLab

pub mod instrument;
pub mod price_point;

pub use instrument::Instrument;
pub use price_point::{PricePoint, Timestamp};

/// Symbol type alias
pub type Symbol = String;
