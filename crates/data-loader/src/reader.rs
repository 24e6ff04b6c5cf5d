//! Streaming, memory-bounded reads of large delimited files.
//!
//! [`ChunkedTableReader`] pulls at most `chunk_rows` raw records from the
//! file per step, runs the row filter on each record as it arrives and keeps
//! only the projected columns of the rows that pass. Peak memory is bounded
//! by one chunk of *filtered* rows; the raw records are never collected.
//!
//! The batch size is a tuning knob only: concatenating every batch gives the
//! same table for any `chunk_rows >= 1`.
//!
//! `.gz` inputs are decompressed transparently based on the file extension.

use crate::error::{DataLoadError, Result};
use crate::parser::normalize_cell;
use crate::table::Table;
use crate::types::Fields;
use csv::StringRecord;
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Default number of raw records per chunk
pub const DEFAULT_CHUNK_ROWS: usize = 250_000;

/// How to parse a delimited file and which columns to keep
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub delimiter: u8,
    /// IMDb dumps contain bare `"` inside titles, so TSV reads disable quoting
    pub quoting: bool,
    pub chunk_rows: usize,
    /// Projected columns, in output order
    pub columns: Vec<String>,
}

impl ReadOptions {
    /// Tab-separated, unquoted (the IMDb dump format)
    pub fn tsv<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            delimiter: b'\t',
            quoting: false,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Comma-separated with standard quoting
    pub fn csv<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            delimiter: b',',
            quoting: true,
            ..Self::tsv(columns)
        }
    }

    pub fn with_chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = chunk_rows;
        self
    }
}

/// A raw record seen by the row filter, with access by column name
pub struct RowView<'a> {
    header: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl Fields for RowView<'_> {
    fn field(&self, name: &str) -> Option<&str> {
        self.header
            .get(name)
            .and_then(|&i| self.record.get(i))
            .and_then(normalize_cell)
    }
}

/// Counters collected while streaming a file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub chunks: usize,
    pub skipped_chunks: usize,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub malformed_rows: usize,
}

enum Chunk {
    Batch(Table),
    Skipped,
}

/// Lazy sequence of filtered, projected row batches over one file
pub struct ChunkedTableReader<F> {
    source_name: String,
    reader: csv::Reader<Box<dyn Read + Send>>,
    header: HashMap<String, usize>,
    projection: Vec<usize>,
    missing: Vec<String>,
    options: ReadOptions,
    filter: F,
    record: StringRecord,
    stats: ReadStats,
    done: bool,
}

/// Open a file for reading, decompressing `.gz` transparently
pub fn open_source(path: &Path) -> Result<Box<dyn Read + Send>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DataLoadError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            DataLoadError::IoError(e)
        }
    })?;
    let buffered = BufReader::with_capacity(1 << 16, file);
    if is_gzip(path) {
        Ok(Box::new(MultiGzDecoder::new(buffered)))
    } else {
        Ok(Box::new(buffered))
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

impl<F> ChunkedTableReader<F>
where
    F: FnMut(&RowView<'_>) -> bool,
{
    /// Open `path` and prepare to stream it.
    ///
    /// Projected columns missing from the header do not fail here: every
    /// chunk of such a file is skipped with a warning instead.
    pub fn open(path: impl AsRef<Path>, options: ReadOptions, filter: F) -> Result<Self> {
        let path = path.as_ref();
        if options.chunk_rows == 0 {
            return Err(DataLoadError::ValidationError(
                "chunk_rows must be at least 1".to_string(),
            ));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quoting(options.quoting)
            .has_headers(true)
            .flexible(true)
            .from_reader(open_source(path)?);

        let header: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();

        let missing: Vec<String> = options
            .columns
            .iter()
            .filter(|c| !header.contains_key(c.as_str()))
            .cloned()
            .collect();
        let projection = options
            .columns
            .iter()
            .filter_map(|c| header.get(c.as_str()).copied())
            .collect();

        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !missing.is_empty() {
            warn!(
                "{} lacks expected columns {:?}; its chunks will be skipped",
                source_name, missing
            );
        }

        Ok(Self {
            source_name,
            reader,
            header,
            projection,
            missing,
            options,
            filter,
            record: StringRecord::new(),
            stats: ReadStats::default(),
            done: false,
        })
    }

    /// Counters for the chunks consumed so far
    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    /// Drain every batch into a single table
    pub fn collect_table(mut self) -> Result<Table> {
        let mut table = Table::new(self.options.columns.clone());
        for batch in &mut self {
            table.append(batch?)?;
        }
        debug!(
            "Finished {}: {:?}",
            self.source_name, self.stats
        );
        Ok(table)
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk>> {
        let mut batch = Table::new(self.options.columns.clone());
        let skip = !self.missing.is_empty();
        let mut raw = 0;

        while raw < self.options.chunk_rows {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    break;
                }
                Err(e) if !e.is_io_error() => {
                    raw += 1;
                    self.stats.malformed_rows += 1;
                    warn!("Skipping malformed row in {}: {}", self.source_name, e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            raw += 1;
            if skip {
                continue;
            }

            let view = RowView {
                header: &self.header,
                record: &self.record,
            };
            if (self.filter)(&view) {
                let row = self
                    .projection
                    .iter()
                    .map(|&i| self.record.get(i).and_then(normalize_cell).map(str::to_string))
                    .collect();
                batch.push_row(row)?;
            }
        }

        if raw == 0 {
            return Ok(None);
        }

        self.stats.chunks += 1;
        self.stats.rows_read += raw;
        if skip {
            self.stats.skipped_chunks += 1;
            warn!(
                "Skipping chunk {} of {} ({} rows): missing columns {:?}",
                self.stats.chunks, self.source_name, raw, self.missing
            );
            return Ok(Some(Chunk::Skipped));
        }

        self.stats.rows_kept += batch.len();
        debug!(
            "Chunk {} of {}: kept {} of {} rows",
            self.stats.chunks,
            self.source_name,
            batch.len(),
            raw
        );
        Ok(Some(Chunk::Batch(batch)))
    }
}

impl<F> Iterator for ChunkedTableReader<F>
where
    F: FnMut(&RowView<'_>) -> bool,
{
    type Item = Result<Table>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            match self.read_chunk() {
                Ok(Some(Chunk::Batch(batch))) => return Some(Ok(batch)),
                Ok(Some(Chunk::Skipped)) => continue,
                Ok(None) => return None,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::path::PathBuf;

    const AKAS: &str = "titleId\tordering\ttitle\tregion\tlanguage\tisOriginalTitle\n\
        tt1\t1\tSholay\tIN\thi\t0\n\
        tt1\t2\tSholay \"Embers\"\tUS\t\\N\t0\n\
        tt2\t1\tRoja\tIN\tta\t1\n\
        tt3\t1\tPather Panchali\tIN\tbn\t1\n\
        tt3\t2\tSong of the Road\tGB\ten\t0\n\
        tt4\t1\tMughal-e-Azam\tIN\t\\N\t1\n\
        tt5\t1\tDevdas\tIN\thi\t0\n";

    fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn indian_rows(path: &Path, chunk_rows: usize) -> Table {
        let options = ReadOptions::tsv(["titleId", "language"]).with_chunk_rows(chunk_rows);
        ChunkedTableReader::open(path, options, |row| row.field("region") == Some("IN"))
            .unwrap()
            .collect_table()
            .unwrap()
    }

    #[test]
    fn test_chunk_size_does_not_change_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "title.akas.tsv", AKAS);

        let reference = indian_rows(&path, 1_000);
        assert_eq!(reference.len(), 5);
        for chunk_rows in 1..=8 {
            assert_eq!(indian_rows(&path, chunk_rows), reference, "chunk_rows={chunk_rows}");
        }
    }

    #[test]
    fn test_batches_arrive_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "title.akas.tsv", AKAS);

        let options = ReadOptions::tsv(["titleId"]).with_chunk_rows(2);
        let ids: Vec<String> = ChunkedTableReader::open(&path, options, |_| true)
            .unwrap()
            .flat_map(|batch| {
                let batch = batch.unwrap();
                batch
                    .column_values("titleId")
                    .unwrap()
                    .into_iter()
                    .map(|v| v.unwrap().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(ids, vec!["tt1", "tt1", "tt2", "tt3", "tt3", "tt4", "tt5"]);
    }

    #[test]
    fn test_unquoted_titles_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "title.akas.tsv", AKAS);

        let options = ReadOptions::tsv(["title", "language"]);
        let table = ChunkedTableReader::open(&path, options, |row| row.field("region") == Some("US"))
            .unwrap()
            .collect_table()
            .unwrap();
        let row = table.row(0).unwrap();
        assert_eq!(row.field("title"), Some("Sholay \"Embers\""));
        assert_eq!(row.field("language"), None);
    }

    #[test]
    fn test_gzip_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("title.akas.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(AKAS.as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(indian_rows(&path, 3).len(), 5);
    }

    #[test]
    fn test_missing_column_skips_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "title.akas.tsv", AKAS);

        let options = ReadOptions::tsv(["titleId", "types"]).with_chunk_rows(3);
        let mut reader = ChunkedTableReader::open(&path, options, |_| true).unwrap();
        assert!(reader.next().is_none());
        let stats = reader.stats();
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.skipped_chunks, 3);
        assert_eq!(stats.rows_kept, 0);
    }

    #[test]
    fn test_missing_file() {
        let result = ChunkedTableReader::open(
            "/no/such/title.basics.tsv.gz",
            ReadOptions::tsv(["tconst"]),
            |_| true,
        );
        assert!(matches!(result, Err(DataLoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_zero_chunk_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "title.akas.tsv", AKAS);
        let options = ReadOptions::tsv(["titleId"]).with_chunk_rows(0);
        assert!(ChunkedTableReader::open(&path, options, |_| true).is_err());
    }
}
