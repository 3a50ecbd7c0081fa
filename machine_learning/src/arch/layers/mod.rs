mod layer;
mod params;

pub use layer::LayerSpec;
pub use params::{BiasTable, LayerPair, WeightTable};
