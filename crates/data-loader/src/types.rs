//! Core domain types for the IMDb flat-file dataset.
//!
//! Records are immutable once read. Identity of a title is its `tconst`
//! (called `titleId` in the akas file), identity of a person is its `nconst`.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================

/// IMDb title identifier (`tt0000001`)
pub type TitleId = String;

/// IMDb person identifier (`nm0000001`)
pub type PersonId = String;

/// Column names used across the input files and intermediate artifacts
pub mod columns {
    pub const TCONST: &str = "tconst";
    pub const TITLE_ID: &str = "titleId";
    pub const NCONST: &str = "nconst";
    pub const TITLE_TYPE: &str = "titleType";
    pub const PRIMARY_TITLE: &str = "primaryTitle";
    pub const START_YEAR: &str = "startYear";
    pub const RUNTIME_MINUTES: &str = "runtimeMinutes";
    pub const GENRES: &str = "genres";
    pub const AVERAGE_RATING: &str = "averageRating";
    pub const NUM_VOTES: &str = "numVotes";
    pub const REGION: &str = "region";
    pub const LANGUAGE: &str = "language";
    pub const TITLE: &str = "title";
    pub const IS_ORIGINAL_TITLE: &str = "isOriginalTitle";
    pub const CATEGORY: &str = "category";
    pub const PRIMARY_NAME: &str = "primaryName";
    pub const DIRECTORS: &str = "directors";
    pub const WRITERS: &str = "writers";
    pub const DIRECTOR_SCORE: &str = "director_score";
    pub const ACTOR_SCORE: &str = "actor_score";
}

/// Named, null-aware access to the fields of one row.
///
/// Implemented by streamed rows ([`crate::reader::RowView`]) and in-memory
/// rows ([`crate::table::TableRow`]) so record parsing works on both.
pub trait Fields {
    /// Value of a column, or `None` when the column is absent or the cell is null
    fn field(&self, name: &str) -> Option<&str>;
}

// =============================================================================
// Title-related Types
// =============================================================================

/// One row of `title.basics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub id: TitleId,
    pub primary_title: String,
    pub start_year: u16,
    pub runtime_minutes: u32,
    /// Genres in file order ("Action,Drama" -> ["Action", "Drama"])
    pub genres: Vec<String>,
    pub title_type: String,
}

impl TitleRecord {
    /// Genres joined back into the comma-separated form used as a category
    pub fn genres_joined(&self) -> String {
        self.genres.join(",")
    }
}

/// One row of `title.ratings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub id: TitleId,
    /// Weighted average on a 0-10 scale
    pub average_rating: f64,
    pub num_votes: u64,
}

/// One row of `title.akas` (a regional title)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AkaRecord {
    pub title_id: TitleId,
    pub region: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_original_title: bool,
}

/// One row of `title.crew`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrewRecord {
    pub id: TitleId,
    pub directors: Vec<PersonId>,
    pub writers: Vec<PersonId>,
}

// =============================================================================
// Person-related Types
// =============================================================================

/// One row of `title.principals`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    pub title_id: TitleId,
    pub person_id: PersonId,
    pub category: String,
}

impl PrincipalRecord {
    /// Whether the credit falls into one of the given acting categories
    pub fn is_credited_as<S: AsRef<str>>(&self, categories: &[S]) -> bool {
        categories.iter().any(|c| c.as_ref() == self.category)
    }
}

/// One row of `name.basics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub person_id: PersonId,
    pub primary_name: String,
}
