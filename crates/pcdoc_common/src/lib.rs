//! pcdoc Common - Knowledge base and inference engine for PC fault diagnosis
//!
//! Turns a set of observed symptoms into a ranked diagnosis using a rule base
//! with positive and negated conditions, or a weighted-clue scoring strategy.
//! User contributions are merged into the running knowledge base without a
//! restart.

pub mod config;
pub mod contribution;
pub mod engine;
pub mod error;
pub mod inference;
pub mod knowledge;

pub use config::*;
pub use contribution::*;
pub use engine::*;
pub use error::*;
pub use inference::*;
pub use knowledge::*;
