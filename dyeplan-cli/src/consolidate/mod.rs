//! Dye plan consolidation: types, engine, workbook I/O, and file readiness

pub mod engine;
pub mod excel;
pub mod readiness;
pub mod types;

pub use engine::*;
pub use readiness::{ReadinessTracker, RoleStatus, SuppliedFile};
pub use types::*;
