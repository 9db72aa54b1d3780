//! Core types for dye plan consolidation

mod value;
mod dataset;
mod workflow;
mod error;

pub use value::*;
pub use dataset::*;
pub use workflow::*;
pub use error::*;
