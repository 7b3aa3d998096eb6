//! Data acquisition and preparation.
//!
//! Responsibilities:
//!
//! - load the CVU CSV into a raw, uncoerced table (`loader`)
//! - clean it and derive the computed columns (`transform`)
//! - generate deterministic synthetic datasets for demos/tests (`sample`)

pub mod loader;
pub mod sample;
pub mod transform;

pub use loader::*;
pub use sample::*;
pub use transform::*;
