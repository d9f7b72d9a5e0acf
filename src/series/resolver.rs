//! Series resolution: turn the path a user opens into the ordered list of
//! LSM image files that make up the dataset.
//!
//! A plain `.lsm` path is a single-series dataset. A `.mdb` project database
//! names its image files in the `SampleData` column of its `Recordings`
//! table; when none of those resolve, every `.lsm` file next to the project
//! is used instead.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::LsmError;
use crate::format::detect::{has_extension, LSM_EXTENSION, MDB_EXTENSION};
use crate::metadata::{MetaValue, MetadataSink};

use super::source::SeriesSource;

/// Table holding the recordings of a project.
pub const RECORDINGS_TABLE: &str = "Recordings";

/// Column of [`RECORDINGS_TABLE`] naming the image file of a recording.
pub const SAMPLE_DATA_COLUMN: &str = "SampleData";

// =============================================================================
// Project Tables
// =============================================================================

/// One table of a project database.
///
/// Row 0 holds the column names: cell 0 is the table name and cells `1..`
/// name the columns. Every later row is a data row whose cell `i` belongs to
/// column `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from its name, column names and data rows.
    pub fn new<S: Into<String>>(
        name: S,
        columns: impl IntoIterator<Item = S>,
        data: Vec<Vec<String>>,
    ) -> Self {
        let mut header = vec![name.into()];
        header.extend(columns.into_iter().map(Into::into));
        let mut rows = vec![header];
        rows.extend(data);
        Self { rows }
    }

    /// Name of the table, if it has a header row.
    pub fn name(&self) -> Option<&str> {
        self.rows.first()?.first().map(String::as_str)
    }

    /// Name of the column holding data cell `index`.
    pub fn column(&self, index: usize) -> Option<&str> {
        self.rows.first()?.get(index + 1).map(String::as_str)
    }

    /// Data rows with their 1-based row numbers.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, row)| (i, row.as_slice()))
    }
}

/// Parser for project database files.
///
/// No database engine ships with this crate; callers that need `.mdb`
/// support plug one in here.
pub trait TableParser {
    /// Read every table of the database at `path`.
    fn parse(&self, path: &Path) -> Result<Vec<Table>, LsmError>;
}

// =============================================================================
// Resolution
// =============================================================================

/// Options controlling series resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// When opening an `.lsm` file, open the project database in the same
    /// directory instead, if there is one.
    pub prefer_project: bool,
}

/// Result of resolving a dataset path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Path the dataset was finally opened through
    pub current: PathBuf,

    /// Image files, one per series, in series order
    pub files: Vec<PathBuf>,
}

impl Resolution {
    /// Whether the dataset was opened through a project database.
    pub fn is_project(&self) -> bool {
        has_extension(&self.current, MDB_EXTENSION)
    }

    /// Files backing the dataset.
    ///
    /// With `no_pixels`, only the project database is listed (nothing for a
    /// plain image). Otherwise the image files are listed, followed by the
    /// opened path unless it is itself the single image file.
    pub fn used_files(&self, no_pixels: bool) -> Vec<PathBuf> {
        if no_pixels {
            return if self.is_project() {
                vec![self.current.clone()]
            } else {
                Vec::new()
            };
        }
        if self.files.len() == 1 && self.files[0] == self.current {
            return self.files.clone();
        }
        let mut files = self.files.clone();
        files.push(self.current.clone());
        files
    }
}

/// Resolve `path` into the image files of its dataset.
///
/// Project table cells are published as global metadata
/// `"<table> <column> <row>"`.
///
/// # Errors
/// Returns [`LsmError::NoFilesFound`] when no image file is found, and
/// propagates table parser and directory listing failures.
pub fn resolve<S: SeriesSource + ?Sized>(
    source: &S,
    tables: Option<&dyn TableParser>,
    path: &Path,
    options: ResolveOptions,
    sink: &mut dyn MetadataSink,
) -> Result<Resolution, LsmError> {
    let current = if has_extension(path, MDB_EXTENSION) {
        path.to_path_buf()
    } else if options.prefer_project {
        match find_project(source, path)? {
            Some(project) => {
                info!(
                    image = %path.display(),
                    project = %project.display(),
                    "opening project database next to image"
                );
                project
            }
            None => path.to_path_buf(),
        }
    } else {
        path.to_path_buf()
    };

    let files = if has_extension(&current, MDB_EXTENSION) {
        resolve_project(source, tables, &current, sink)?
    } else {
        vec![current.clone()]
    };

    if files.is_empty() {
        return Err(LsmError::NoFilesFound(current.display().to_string()));
    }
    debug!(path = %current.display(), series = files.len(), "resolved dataset");

    Ok(Resolution { current, files })
}

/// First non-directory `.mdb` entry in the directory of `image`.
fn find_project<S: SeriesSource + ?Sized>(
    source: &S,
    image: &Path,
) -> Result<Option<PathBuf>, LsmError> {
    let Some(dir) = parent_dir(image) else {
        return Ok(None);
    };
    let mut entries = source.list_dir(dir)?;
    entries.sort();
    Ok(entries
        .into_iter()
        .find(|entry| has_extension(entry, MDB_EXTENSION) && !source.is_dir(entry)))
}

fn resolve_project<S: SeriesSource + ?Sized>(
    source: &S,
    tables: Option<&dyn TableParser>,
    project: &Path,
    sink: &mut dyn MetadataSink,
) -> Result<Vec<PathBuf>, LsmError> {
    let dir = parent_dir(project).unwrap_or(Path::new("."));

    let referenced = match tables {
        Some(parser) => {
            let tables = parser.parse(project)?;
            referenced_files(source, dir, &tables, sink)
        }
        None => {
            warn!(
                project = %project.display(),
                "no table parser configured; listing directory instead"
            );
            Vec::new()
        }
    };
    if !referenced.is_empty() {
        return Ok(referenced);
    }

    let mut listed: Vec<PathBuf> = source
        .list_dir(dir)?
        .into_iter()
        .filter(|entry| has_extension(entry, LSM_EXTENSION) && !source.is_dir(entry))
        .collect();
    listed.sort();
    debug!(dir = %dir.display(), files = listed.len(), "fell back to directory listing");
    Ok(listed)
}

/// Publish every table cell and collect the recordings' image files that
/// exist next to the project.
fn referenced_files<S: SeriesSource + ?Sized>(
    source: &S,
    dir: &Path,
    tables: &[Table],
    sink: &mut dyn MetadataSink,
) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for table in tables {
        let Some(name) = table.name() else {
            continue;
        };
        for (row, cells) in table.data_rows() {
            for (i, cell) in cells.iter().enumerate() {
                let column = table.column(i);
                let key = format!("{} {} {}", name, column.unwrap_or("null"), row);
                sink.put_global(&key, MetaValue::from(cell.as_str()));

                if name != RECORDINGS_TABLE || column != Some(SAMPLE_DATA_COLUMN) {
                    continue;
                }
                let Some(file_name) = sample_file_name(cell) else {
                    continue;
                };
                let candidate = dir.join(file_name);
                if source.exists(&candidate) {
                    files.push(candidate);
                } else {
                    debug!(path = %candidate.display(), "referenced recording not found");
                }
            }
        }
    }
    files
}

/// Last path component of a `SampleData` cell, accepting either separator.
pub fn sample_file_name(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    let name = trimmed.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(trimmed);
    (!name.is_empty()).then_some(name)
}

fn parent_dir(path: &Path) -> Option<&Path> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(Path::new(".")),
        other => other,
    }
}

// =============================================================================
// Tests
// =============================================================================
