pub mod consolidate;
pub mod sheets;
pub mod workflows;
