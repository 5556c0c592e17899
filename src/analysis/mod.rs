pub mod classify;
pub mod encouragement;
pub mod suggestions;
pub mod validate;

pub use classify::{classify, thresholds_for, Classification, Thresholds, WarningTracker};
pub use encouragement::build_encouragement;
pub use suggestions::extract_top;
pub use validate::{normalize_score, validate};
