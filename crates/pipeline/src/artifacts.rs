//! Intermediate tables passed between stages.
//!
//! Each stage reads its inputs from and writes its outputs to an
//! [`ArtifactStore`]. Tables are kept in memory for the rest of the run and
//! mirrored as CSV under the output directory, so a later run can start from
//! any stage whose inputs are already on disk.

use data_loader::{Result, Table};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    /// Filtered, rated, language-tagged movies
    Movies,
    MoviesWithDirectorScores,
    /// `primaryName, director_score`
    DirectorScores,
    MoviesWithDirectorActorScores,
    /// `primaryName, actor_score`
    ActorScores,
}

impl Artifact {
    pub const ALL: [Artifact; 5] = [
        Artifact::Movies,
        Artifact::MoviesWithDirectorScores,
        Artifact::DirectorScores,
        Artifact::MoviesWithDirectorActorScores,
        Artifact::ActorScores,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Movies => "movies.csv",
            Artifact::MoviesWithDirectorScores => "movies_with_director_scores.csv",
            Artifact::DirectorScores => "director_scores.csv",
            Artifact::MoviesWithDirectorActorScores => "movies_with_director_actor_scores.csv",
            Artifact::ActorScores => "actor_scores.csv",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Explicit handle to the tables of one pipeline run
pub struct ArtifactStore {
    out_dir: Option<PathBuf>,
    tables: HashMap<Artifact, Table>,
}

impl ArtifactStore {
    /// Store mirrored to CSV files under `out_dir`
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: Some(out_dir.into()),
            tables: HashMap::new(),
        }
    }

    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            out_dir: None,
            tables: HashMap::new(),
        }
    }

    pub fn out_dir(&self) -> Option<&Path> {
        self.out_dir.as_deref()
    }

    pub fn path(&self, artifact: Artifact) -> Option<PathBuf> {
        self.out_dir.as_ref().map(|dir| dir.join(artifact.file_name()))
    }

    /// Held in memory or present on disk
    pub fn available(&self, artifact: Artifact) -> bool {
        self.tables.contains_key(&artifact) || self.path(artifact).is_some_and(|p| p.is_file())
    }

    /// Record a stage output, writing its CSV mirror
    pub fn put(&mut self, artifact: Artifact, table: Table) -> Result<()> {
        if let Some(path) = self.path(artifact) {
            table.write_csv(&path)?;
            info!("Wrote {} rows to {}", table.len(), path.display());
        }
        self.tables.insert(artifact, table);
        Ok(())
    }

    /// Fetch a table, loading it from disk on first use
    pub fn get(&mut self, artifact: Artifact) -> Result<&Table> {
        if !self.tables.contains_key(&artifact) {
            let path = self.path(artifact).ok_or_else(|| data_loader::DataLoadError::FileNotFound {
                path: artifact.file_name().to_string(),
            })?;
            let table = Table::read_csv(&path)?;
            debug!("Loaded {} rows from {}", table.len(), path.display());
            self.tables.insert(artifact, table);
        }
        Ok(&self.tables[&artifact])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["tconst", "averageRating"]);
        t.push_row(vec![Some("tt1".into()), Some("7.1".into())]).unwrap();
        t
    }

    #[test]
    fn test_put_mirrors_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ArtifactStore::new(dir.path());
        store.put(Artifact::Movies, sample()).unwrap();
        assert!(dir.path().join("movies.csv").is_file());

        let mut fresh = ArtifactStore::new(dir.path());
        assert!(fresh.available(Artifact::Movies));
        assert_eq!(fresh.get(Artifact::Movies).unwrap(), &sample());
    }

    #[test]
    fn test_get_does_not_substitute_another_table() {
        let mut store = ArtifactStore::in_memory();
        store.put(Artifact::Movies, sample()).unwrap();
        assert!(store.available(Artifact::Movies));
        assert!(!store.available(Artifact::MoviesWithDirectorActorScores));
        assert!(store.get(Artifact::MoviesWithDirectorActorScores).is_err());
    }

    #[test]
    fn test_in_memory_missing_artifact() {
        let mut store = ArtifactStore::in_memory();
        assert!(!store.available(Artifact::ActorScores));
        assert!(store.get(Artifact::ActorScores).is_err());
    }
}
