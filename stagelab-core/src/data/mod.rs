//! Data sources, input schema contract and DataFrame conversion.

pub mod frame;
pub mod provider;
pub mod schema;

pub use frame::frame_to_series;
pub use provider::{DataError, InMemoryMetadata, InMemoryPrices, MetadataSource, PriceSource};
pub use schema::{PriceSchema, SchemaError};
