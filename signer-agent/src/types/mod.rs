pub mod deserializers;
pub mod near;

pub use near::*;
