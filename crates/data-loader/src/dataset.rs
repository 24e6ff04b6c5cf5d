//! Discovery of the IMDb dump files in a data directory.
//!
//! Title basics and ratings are required; without them there is nothing to
//! join and the run stops. The other files only enrich the table, so a
//! missing one is reported and its stage degrades.

use crate::error::{DataLoadError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The dump files a pipeline run can use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImdbFiles {
    pub basics: PathBuf,
    pub ratings: PathBuf,
    pub akas: Option<PathBuf>,
    pub crew: Option<PathBuf>,
    pub principals: Option<PathBuf>,
    pub names: Option<PathBuf>,
}

/// Find `<stem>.tsv.gz` or `<stem>.tsv` in `dir`, preferring the compressed file
fn find(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["tsv.gz", "tsv"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

impl ImdbFiles {
    /// Locate all dump files under `data_dir`
    pub fn locate(data_dir: &Path) -> Result<Self> {
        let basics = find(data_dir, "title.basics");
        let ratings = find(data_dir, "title.ratings");

        let (basics, ratings) = match (basics, ratings) {
            (Some(b), Some(r)) => (b, r),
            (b, r) => {
                let missing = [("title.basics", b.is_none()), ("title.ratings", r.is_none())]
                    .iter()
                    .filter(|(_, absent)| *absent)
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(DataLoadError::NoInputFiles {
                    dir: data_dir.display().to_string(),
                    missing,
                });
            }
        };

        let optional = |stem: &str| {
            let found = find(data_dir, stem);
            if found.is_none() {
                warn!("{} not found in {}; dependent steps will degrade", stem, data_dir.display());
            }
            found
        };

        let files = Self {
            basics,
            ratings,
            akas: optional("title.akas"),
            crew: optional("title.crew"),
            principals: optional("title.principals"),
            names: optional("name.basics"),
        };
        info!("Located IMDb dataset in {}", data_dir.display());
        Ok(files)
    }
}
