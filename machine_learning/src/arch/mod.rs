pub mod activations;
mod forward;
mod gradients;
pub mod layers;
pub mod loss;

pub use forward::forward;
pub(crate) use forward::trace;
pub use gradients::Gradients;
