//! # Data Loader Crate
//!
//! This crate handles reading the IMDb flat-file dumps.
//!
//! ## Main Components
//!
//! - **types**: Record types (TitleRecord, RatingRecord, AkaRecord, ...) and the `Fields` trait
//! - **parser**: Null-aware cell normalization and record parsing
//! - **table**: In-memory `Table` passed between pipeline stages, CSV artifacts
//! - **reader**: `ChunkedTableReader`, memory-bounded streaming over large TSV files
//! - **language**: Script-based language detection
//! - **dataset**: Locating the dump files in a data directory
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{ChunkedTableReader, ReadOptions, Fields};
//!
//! // Stream only the Indian regional titles, 250k raw rows at a time
//! let options = ReadOptions::tsv(["titleId", "title", "language", "isOriginalTitle"]);
//! let reader = ChunkedTableReader::open("data/title.akas.tsv.gz", options, |row| {
//!     row.field("region") == Some("IN")
//! })?;
//! for batch in reader {
//!     let batch = batch?;
//!     println!("{} rows", batch.len());
//! }
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod table;
pub mod reader;
pub mod language;
pub mod dataset;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    TitleId,
    PersonId,
    // Records
    TitleRecord,
    RatingRecord,
    AkaRecord,
    CrewRecord,
    PrincipalRecord,
    PersonRecord,
    Fields,
};
pub use table::{Cell, Table, TableRow};
pub use reader::{ChunkedTableReader, ReadOptions, ReadStats, RowView, DEFAULT_CHUNK_ROWS};
pub use language::{detect_language, ScriptLanguageDetector, SCRIPT_RANGES};
pub use dataset::ImdbFiles;
