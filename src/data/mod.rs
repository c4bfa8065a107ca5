//! Data layer: core types, loading, derivation, selection and asset lookup.
//!
//! Architecture:
//! ```text
//!  .csv / .parquet / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → RawColumns
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  derive   │  per-session velocity from position
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │ SignalTable │  columns, session index, facet values
//!   └─────────────┘
//!        │
//!        ├───────────────┐
//!        ▼               ▼
//!   ┌──────────┐   ┌──────────┐
//!   │  select   │   │  asset    │  video path by naming convention
//!   └──────────┘   └──────────┘
//! ```

pub mod asset;
pub mod derive;
pub mod error;
pub mod loader;
pub mod model;
pub mod select;

pub use asset::AssetResolver;
pub use error::DataError;
pub use model::{
    AcousticFeature, Channel, Facet, FacetTuple, KinematicFeature, MetadataValue, SignalTable,
};
pub use select::{Selection, SelectionCache, SelectionResult, select};
