pub mod entity;
pub mod invariants;

pub use entity::{EpisodeSet, ReconciledList, SortOrder};
pub use invariants::validate_reconciled_list;
