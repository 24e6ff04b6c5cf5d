//! Cell normalization and record parsing.
//!
//! IMDb files mark missing values with `\N`. Every accessor in this crate
//! goes through [`normalize_cell`], so `\N`, empty and whitespace-only
//! cells all read as null.
//!
//! The `parse_*` functions turn a row (streamed or in-memory) into a typed
//! record and double as row filters: a row that does not satisfy the record
//! invariants fails to parse and is dropped by the caller.

use crate::error::{DataLoadError, Result};
use crate::types::columns::*;
use crate::types::*;
use std::ops::RangeInclusive;

/// Null marker used by the IMDb dumps
pub const NULL_MARKER: &str = "\\N";

/// Map a raw cell to `None` when it is null, otherwise to its trimmed text
pub fn normalize_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NULL_MARKER {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse a four-digit-style year; anything that is not all ASCII digits is rejected
pub fn parse_year(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Interpret IMDb's bool-like flags ("1"/"0", "true"/"false")
pub fn parse_bool_like(s: &str) -> bool {
    matches!(s.trim(), "1" | "1.0" | "true" | "True" | "TRUE")
}

/// Split a comma-separated id or genre list, skipping empty entries
pub fn split_list(s: Option<&str>) -> Vec<String> {
    s.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn required<'a, F: Fields + ?Sized>(row: &'a F, column: &str) -> Result<&'a str> {
    row.field(column)
        .ok_or_else(|| DataLoadError::invalid(column, NULL_MARKER))
}

fn parse_number<T: std::str::FromStr>(column: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DataLoadError::invalid(column, value))
}

/// Parse a `title.basics` row.
///
/// Enforces the record invariants: a numeric start year inside `years`,
/// a positive runtime and at least one genre.
pub fn parse_title<F: Fields + ?Sized>(row: &F, years: &RangeInclusive<u16>) -> Result<TitleRecord> {
    let id = required(row, TCONST)?;
    let title_type = required(row, TITLE_TYPE)?;
    let primary_title = required(row, PRIMARY_TITLE)?;

    let year_str = required(row, START_YEAR)?;
    let start_year =
        parse_year(year_str).ok_or_else(|| DataLoadError::invalid(START_YEAR, year_str))?;
    if !years.contains(&start_year) {
        return Err(DataLoadError::invalid(START_YEAR, year_str));
    }

    let runtime_str = required(row, RUNTIME_MINUTES)?;
    let runtime_minutes: u32 = parse_number(RUNTIME_MINUTES, runtime_str)?;
    if runtime_minutes == 0 {
        return Err(DataLoadError::invalid(RUNTIME_MINUTES, runtime_str));
    }

    let genres = split_list(row.field(GENRES));
    if genres.is_empty() {
        return Err(DataLoadError::invalid(GENRES, NULL_MARKER));
    }

    Ok(TitleRecord {
        id: id.to_string(),
        primary_title: primary_title.to_string(),
        start_year,
        runtime_minutes,
        genres,
        title_type: title_type.to_string(),
    })
}

/// Parse a `title.ratings` row; the rating must be finite and within 0-10
pub fn parse_rating<F: Fields + ?Sized>(row: &F) -> Result<RatingRecord> {
    let id = required(row, TCONST)?;
    let rating_str = required(row, AVERAGE_RATING)?;
    let average_rating: f64 = parse_number(AVERAGE_RATING, rating_str)?;
    if !average_rating.is_finite() || !(0.0..=10.0).contains(&average_rating) {
        return Err(DataLoadError::invalid(AVERAGE_RATING, rating_str));
    }
    let num_votes = parse_number(NUM_VOTES, required(row, NUM_VOTES)?)?;

    Ok(RatingRecord {
        id: id.to_string(),
        average_rating,
        num_votes,
    })
}

/// Parse a `title.akas` row. Only the title id is required.
pub fn parse_aka<F: Fields + ?Sized>(row: &F) -> Result<AkaRecord> {
    Ok(AkaRecord {
        title_id: required(row, TITLE_ID)?.to_string(),
        region: row.field(REGION).map(str::to_string),
        language: row.field(LANGUAGE).map(str::to_string),
        title: row.field(TITLE).map(str::to_string),
        is_original_title: row.field(IS_ORIGINAL_TITLE).is_some_and(parse_bool_like),
    })
}

/// Parse a `title.crew` row
pub fn parse_crew<F: Fields + ?Sized>(row: &F) -> Result<CrewRecord> {
    Ok(CrewRecord {
        id: required(row, TCONST)?.to_string(),
        directors: split_list(row.field(DIRECTORS)),
        writers: split_list(row.field(WRITERS)),
    })
}

/// Parse a `title.principals` row
pub fn parse_principal<F: Fields + ?Sized>(row: &F) -> Result<PrincipalRecord> {
    Ok(PrincipalRecord {
        title_id: required(row, TCONST)?.to_string(),
        person_id: required(row, NCONST)?.to_string(),
        category: required(row, CATEGORY)?.to_string(),
    })
}

/// Parse a `name.basics` row
pub fn parse_person<F: Fields + ?Sized>(row: &F) -> Result<PersonRecord> {
    Ok(PersonRecord {
        person_id: required(row, NCONST)?.to_string(),
        primary_name: required(row, PRIMARY_NAME)?.to_string(),
    })
}
