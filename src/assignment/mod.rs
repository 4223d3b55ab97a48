//! Clip assignment: deciding which clip an annotator labels next.

mod curated;
mod quota;
mod selector;

pub use curated::{load_curated_list, CuratedQueue};
pub use quota::{QuotaTracker, ANNOTATION_QUOTA};
pub use selector::{AssignmentMode, AssignmentSelector};
