//! The configuration document a network is persisted and exchanged as, and its translation into
//! the types the training engine works with.

mod adapter;
mod document;
mod error;
mod export;
mod store;

pub use adapter::{Adapter, Network};
pub use document::{
    DEFAULT_SAMPLE_SIZE, NetworkConfig, NeuronLayer, TrainingParams, layer_key, parse_layer_key,
};
pub use error::{ConfigErr, Result};
pub use export::{Format, export};
pub use store::{ConfigStore, FileStore};
