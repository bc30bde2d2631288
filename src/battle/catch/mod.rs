pub mod calculation;
pub mod validation;

pub use calculation::*;
pub use validation::*;
