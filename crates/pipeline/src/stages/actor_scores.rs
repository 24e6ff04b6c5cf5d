//! Stage that attaches an actor score to every movie.
//!
//! Cast credits are streamed from `title.principals`, restricted to the
//! acting categories and to titles in the movie table. The many-to-many
//! credit join is resolved by averaging per title.

use crate::aggregate::{attach_score, score_people, score_table};
use crate::artifacts::{Artifact, ArtifactStore};
use crate::join::key_set;
use crate::stages::{StageContext, read_names, with_null_column};
use crate::traits::Stage;
use anyhow::{Context, Result};
use data_loader::parser::parse_principal;
use data_loader::types::columns;
use data_loader::{ChunkedTableReader, ReadOptions, Table};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ActorScoreStage {
    ctx: Arc<StageContext>,
}

impl ActorScoreStage {
    pub fn new(ctx: Arc<StageContext>) -> Self {
        Self { ctx }
    }

    fn read_cast(&self, path: &Path, titles: &HashSet<String>) -> data_loader::Result<Table> {
        let categories = &self.ctx.config.acting_categories;
        let options = ReadOptions::tsv([columns::TCONST, columns::NCONST])
            .with_chunk_rows(self.ctx.config.chunk_rows);
        ChunkedTableReader::open(path, options, |row| {
            parse_principal(row)
                .is_ok_and(|p| p.is_credited_as(categories.as_slice()) && titles.contains(&p.title_id))
        })?
        .collect_table()
    }
}

impl Stage for ActorScoreStage {
    fn name(&self) -> &str {
        "ActorScoreStage"
    }

    fn requires(&self) -> &[Artifact] {
        &[Artifact::MoviesWithDirectorScores]
    }

    fn produces(&self) -> &[Artifact] {
        &[Artifact::MoviesWithDirectorActorScores, Artifact::ActorScores]
    }

    fn run(&self, store: &mut ArtifactStore) -> Result<()> {
        let movies = store.get(Artifact::MoviesWithDirectorScores)?.clone();
        let files = &self.ctx.files;

        let (scored, scores) = match (&files.principals, &files.names) {
            (Some(principals), Some(names_path)) => {
                let titles = key_set(&movies, columns::TCONST)?;
                let cast = self
                    .read_cast(principals, &titles)
                    .context("Failed to read principals")?;
                let ids = key_set(&cast, columns::NCONST)?;
                let names = read_names(names_path, &ids, self.ctx.config.chunk_rows)
                    .context("Failed to read names")?;
                let scores = score_people(&movies, &cast, &names)?;
                info!(
                    "Actor scores for {} people over {} movies from {} credits",
                    scores.by_person.len(),
                    scores.by_title.len(),
                    cast.len()
                );
                let scored = attach_score(&movies, &scores.by_title, columns::TCONST, columns::ACTOR_SCORE)?;
                (scored, scores.by_person)
            }
            _ => {
                warn!("No principals or names available; actor scores left empty");
                (
                    with_null_column(&movies, columns::ACTOR_SCORE)?,
                    Default::default(),
                )
            }
        };

        store.put(Artifact::MoviesWithDirectorActorScores, scored)?;
        store.put(
            Artifact::ActorScores,
            score_table(&scores, columns::PRIMARY_NAME, columns::ACTOR_SCORE)?,
        )?;
        Ok(())
    }
}
