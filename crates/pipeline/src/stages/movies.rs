//! Stage that builds the movie table from the raw dumps.
//!
//! ## Algorithm
//! 1. Stream title basics (movies in the year window) and ratings in parallel
//! 2. Inner join them on `tconst`
//! 3. Left join the crew lists
//! 4. Resolve one regional language per title from the akas and left join it
//! 5. Fill a missing language from the script of the primary title
//! 6. Drop titles without a target language and duplicate primary titles

use crate::artifacts::{Artifact, ArtifactStore};
use crate::dedup::{AkaRank, KeyedReducer, resolve_aka_language};
use crate::join::{JoinKey, inner_join, key_set, left_join};
use crate::stages::{StageContext, with_null_column};
use crate::traits::Stage;
use anyhow::{Context, Result};
use data_loader::parser::{parse_aka, parse_crew, parse_rating, parse_title};
use data_loader::types::columns;
use data_loader::{Cell, ChunkedTableReader, Fields, ReadOptions, ScriptLanguageDetector, Table};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub struct MovieStage {
    ctx: Arc<StageContext>,
}

impl MovieStage {
    pub fn new(ctx: Arc<StageContext>) -> Self {
        Self { ctx }
    }

    fn read_basics(&self) -> data_loader::Result<Table> {
        let config = &self.ctx.config;
        let years = config.year_range();
        let options = ReadOptions::tsv([
            columns::TCONST,
            columns::PRIMARY_TITLE,
            columns::START_YEAR,
            columns::RUNTIME_MINUTES,
            columns::GENRES,
        ])
        .with_chunk_rows(config.chunk_rows);
        ChunkedTableReader::open(&self.ctx.files.basics, options, |row| {
            row.field(columns::TITLE_TYPE) == Some(config.title_type.as_str())
                && parse_title(row, &years).is_ok()
        })?
        .collect_table()
    }

    fn read_ratings(&self) -> data_loader::Result<Table> {
        let options = ReadOptions::tsv([columns::TCONST, columns::AVERAGE_RATING, columns::NUM_VOTES])
            .with_chunk_rows(self.ctx.config.chunk_rows);
        ChunkedTableReader::open(&self.ctx.files.ratings, options, |row| parse_rating(row).is_ok())?
            .collect_table()
    }

    fn attach_crew(&self, movies: Table) -> Result<Table> {
        let Some(path) = &self.ctx.files.crew else {
            let movies = with_null_column(&movies, columns::DIRECTORS)?;
            return Ok(with_null_column(&movies, columns::WRITERS)?);
        };
        let ids = key_set(&movies, columns::TCONST)?;
        let options = ReadOptions::tsv([columns::TCONST, columns::DIRECTORS, columns::WRITERS])
            .with_chunk_rows(self.ctx.config.chunk_rows);
        let crew = ChunkedTableReader::open(path, options, |row| {
            parse_crew(row).is_ok_and(|c| ids.contains(&c.id))
        })?
        .collect_table()
        .context("Failed to read crew")?;
        info!("Crew lists for {} of {} movies", crew.len(), movies.len());
        Ok(left_join(&movies, &crew, &JoinKey::on(columns::TCONST))?)
    }

    /// One language per title from the regional titles
    fn read_aka_languages(&self, ids: &HashSet<String>) -> Result<Option<Table>> {
        let Some(path) = &self.ctx.files.akas else {
            return Ok(None);
        };
        let config = &self.ctx.config;
        let targets = config.target_set();
        let detector = ScriptLanguageDetector;

        let options = ReadOptions::tsv([
            columns::TITLE_ID,
            columns::REGION,
            columns::LANGUAGE,
            columns::TITLE,
            columns::IS_ORIGINAL_TITLE,
        ])
        .with_chunk_rows(config.chunk_rows);
        let reader = ChunkedTableReader::open(path, options, |row| {
            row.field(columns::TITLE_ID).is_some_and(|id| ids.contains(id))
                && config
                    .region
                    .as_deref()
                    .is_none_or(|region| row.field(columns::REGION) == Some(region))
        })?;

        let mut reducer = KeyedReducer::new(
            vec![columns::TITLE_ID.to_string(), columns::LANGUAGE.to_string()],
            columns::TITLE_ID,
        )?;
        for batch in reader {
            let batch = batch.context("Failed to read akas")?;
            for row in batch.rows() {
                let Ok(aka) = parse_aka(&row) else { continue };
                if let Some((language, source)) = resolve_aka_language(&aka, &targets, &detector) {
                    reducer.offer(
                        AkaRank::new(source, aka.is_original_title),
                        vec![Some(aka.title_id), Some(language)],
                    );
                }
            }
        }
        info!("Resolved regional languages for {} titles", reducer.len());
        Ok(Some(reducer.finish()?))
    }

    fn attach_language(&self, movies: Table) -> Result<Table> {
        let ids = key_set(&movies, columns::TCONST)?;
        let mut movies = match self.read_aka_languages(&ids)? {
            Some(languages) => left_join(&movies, &languages, &JoinKey::new(columns::TCONST, columns::TITLE_ID))?,
            None => with_null_column(&movies, columns::LANGUAGE)?,
        };

        let targets = self.ctx.config.target_set();
        let detector = ScriptLanguageDetector;
        let title_idx = movies.require_column(columns::PRIMARY_TITLE)?;
        let lang_idx = movies.require_column(columns::LANGUAGE)?;
        let mut detected = 0usize;
        let filled: Vec<Cell> = movies
            .rows()
            .map(|row| match row.at(lang_idx) {
                Some(lang) => Some(lang.to_string()),
                None => detector
                    .detect(row.at(title_idx))
                    .filter(|code| targets.contains(*code))
                    .map(|code| {
                        detected += 1;
                        code.to_string()
                    }),
            })
            .collect();
        movies.set_column(columns::LANGUAGE, filled)?;

        let before = movies.len();
        movies.retain(|row| row.field(columns::LANGUAGE).is_some());
        info!(
            "Languages: {} filled from primary titles, {} titles without a target language dropped",
            detected,
            before - movies.len()
        );
        Ok(movies)
    }
}

impl Stage for MovieStage {
    fn name(&self) -> &str {
        "MovieStage"
    }

    fn requires(&self) -> &[Artifact] {
        &[]
    }

    fn produces(&self) -> &[Artifact] {
        &[Artifact::Movies]
    }

    fn run(&self, store: &mut ArtifactStore) -> Result<()> {
        let (basics, ratings) = rayon::join(|| self.read_basics(), || self.read_ratings());
        let basics = basics.context("Failed to read title basics")?;
        let ratings = ratings.context("Failed to read ratings")?;
        info!("{} movies in range, {} rated titles", basics.len(), ratings.len());

        let movies = inner_join(&basics, &ratings, &JoinKey::on(columns::TCONST))?;
        if movies.is_empty() {
            warn!("No movie survived the basics/ratings join");
        }
        let movies = self.attach_crew(movies)?;
        let movies = self.attach_language(movies)?;

        let before = movies.len();
        let movies = movies.dedup_by(columns::PRIMARY_TITLE)?;
        info!(
            "{} movies prepared ({} duplicate titles dropped)",
            movies.len(),
            before - movies.len()
        );
        store.put(Artifact::Movies, movies)?;
        Ok(())
    }
}
