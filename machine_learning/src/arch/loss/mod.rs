mod geometric;
mod neighbors;

pub use geometric::GeometricLoss;
pub use neighbors::nearest_neighbors;

/// The most neighbors an example is compared against in the geometric term.
pub const MAX_NEIGHBORS: usize = 5;
