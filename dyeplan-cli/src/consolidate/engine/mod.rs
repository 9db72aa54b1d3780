//! Consolidation engine: sheet selection, lookup building, enrichment, orchestration

mod sheet_select;
mod lookup;
mod enrich;
mod orchestrator;

pub use sheet_select::{select_sheet, sheet_version, SheetSelection};
pub use lookup::LookupTable;
pub use enrich::{apply, dedup_by_key, MatchStats};
pub use orchestrator::{Enrichment, JoinReport, MergeOrchestrator};
