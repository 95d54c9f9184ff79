//! Request handlers: one module per request family from spec.md §4.3's
//! seven supported request types.

pub mod derive;
pub mod register;
pub mod sign;
pub mod threshold;
