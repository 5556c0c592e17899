pub mod analysis;
pub mod feed;
pub mod session;
pub mod settings;

pub use analysis::{AnalysisResult, AnalysisRuntime, Category, CategoryAssessment, Issue};
pub use feed::{Delivery, FeedCategory, FeedItem};
pub use session::Session;
pub use settings::{ApiProvider, Sensitivity, Settings};
