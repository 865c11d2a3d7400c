//! `rollmatch-recon`: attendee roster matching engine.
//!
//! Pure engine crate: receives pre-loaded survey and registration records,
//! assigns each survey entry to at most one registration, and returns
//! classified reports. No CLI, terminal or HTTP dependencies.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod fuzz;
pub mod model;
pub mod normalize;
pub mod pool;
pub mod roster;
pub mod scorer;
pub mod summary;

pub use config::{MatchConfig, MatcherKind};
pub use engine::run;
pub use error::MatchError;
pub use model::{MatchInput, MatchReport, MatchRun, NameRecord, PoolTag};
pub use scorer::{LexicalScorer, Scorer, SemanticBackend, SemanticScorer, SplitNameScorer};
