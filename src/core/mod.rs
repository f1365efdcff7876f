mod engine;
mod types;

pub use engine::{future_value, project};
pub use types::{Inputs, Projection};
