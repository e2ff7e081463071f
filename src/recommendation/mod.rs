//! Weighted-signal recommendations over available listings.

pub mod engine;
pub mod scoring;
pub mod signals;
pub mod weights;

pub use engine::RecommendationEngine;
pub use signals::{SearchCriteria, UserSignals};
pub use weights::ScoringWeights;
