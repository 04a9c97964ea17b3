// crates/core/src/lib.rs
//! Domain types and pure logic for letterscope: the job model, text
//! extraction and letter-frequency analysis.

pub mod analysis;
pub mod error;
pub mod extract;
pub mod types;

pub use analysis::{analyze, progress_step};
pub use error::*;
pub use extract::{DocumentFormat, Extractor, FormatExtractor};
pub use types::*;
