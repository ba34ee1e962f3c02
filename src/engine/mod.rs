//! The incremental engine: the reconciling highlight pass, the dirty-set
//! scheduler that drives it in bounded slices, the indentation engine, and
//! the selection-remapping collaborator they report fragment surgery to.

pub mod highlight;
pub mod indent;
pub mod scheduler;
pub mod selection;

pub use highlight::PassReport;
pub use scheduler::{DirtyScheduler, PassOutcome};
pub use selection::{Anchor, AnchorId, AnchorSet, NoSelection, SelectionTracker};
