//! Expert Ranking
//!
//! Derived, recomputable expert score built from reviews, completion rate
//! and responsiveness. Scores are a materialized view: they are recomputed
//! on booking completion, cancellation and review, and by the periodic
//! worker, never edited.

pub mod engine;
pub mod types;

pub use engine::{RankingEngine, compute_score};
pub use types::{RankingFactors, RankingScore, RankingSignals};
