//! Tree extraction: convert a file or folder into mirrored `.txt` files

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;

use super::registry::ExtractorRegistry;

/// A file that could not be read or written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Input path
    #[serde(rename = "in")]
    pub input: String,
    /// Error message
    pub error: String,
}

/// A warning raised while converting a file that was still written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileWarning {
    /// Input path
    #[serde(rename = "in")]
    pub input: String,
    /// Warning text
    pub warning: String,
}

/// Batch summary, printed by the extract tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    /// Files written
    pub ok: usize,
    /// Files that failed
    pub fail: usize,
    /// Failure details
    pub files: Vec<FileFailure>,
    /// Warnings from files that were written
    pub warnings: Vec<FileWarning>,
}

impl ExtractStats {
    fn failure(&mut self, input: &Path, error: impl ToString) {
        self.fail += 1;
        self.files.push(FileFailure {
            input: input.display().to_string(),
            error: error.to_string(),
        });
    }
}

/// Files to convert, resolved before any work starts
#[derive(Debug, Clone)]
pub struct ExtractPlan {
    /// Directory that output paths are made relative to
    pub root: PathBuf,
    /// Input files in walk order
    pub files: Vec<PathBuf>,
    /// Entries the directory walk could not visit
    pub walk_errors: Vec<(PathBuf, String)>,
}

impl ExtractPlan {
    /// Total inputs, including unvisitable entries
    pub fn len(&self) -> usize {
        self.files.len() + self.walk_errors.len()
    }

    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Converts every file under an input path and mirrors the tree as text
pub struct BatchExtractor {
    registry: ExtractorRegistry,
}

impl BatchExtractor {
    /// Create a batch extractor over `registry`
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `input` into a list of files
    ///
    /// Folders are walked recursively in file-name order. A single file is
    /// taken relative to its parent directory.
    pub fn plan(input: &Path) -> Result<ExtractPlan> {
        let metadata = std::fs::metadata(input)?;

        if !metadata.is_dir() {
            let root = input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return Ok(ExtractPlan {
                root,
                files: vec![input.to_path_buf()],
                walk_errors: Vec::new(),
            });
        }

        let mut files = Vec::new();
        let mut walk_errors = Vec::new();
        for entry in WalkDir::new(input).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| input.to_path_buf());
                    walk_errors.push((path, e.to_string()));
                }
            }
        }

        Ok(ExtractPlan {
            root: input.to_path_buf(),
            files,
            walk_errors,
        })
    }

    /// Output path for `file`: its path relative to `root` under `out_root`, extension `.txt`
    pub fn output_path(root: &Path, file: &Path, out_root: &Path) -> PathBuf {
        let relative = file
            .strip_prefix(root)
            .unwrap_or_else(|_| Path::new(file.file_name().unwrap_or(file.as_os_str())));
        out_root.join(relative).with_extension("txt")
    }

    /// Plan and run in one step
    pub fn run<F>(&self, input: &Path, out_root: &Path, on_file: F) -> Result<ExtractStats>
    where
        F: FnMut(&Path),
    {
        let plan = Self::plan(input)?;
        Ok(self.run_plan(&plan, out_root, on_file))
    }

    /// Convert every planned file; one file's failure never stops the batch
    ///
    /// `on_file` is called once per input after it has been handled.
    pub fn run_plan<F>(&self, plan: &ExtractPlan, out_root: &Path, mut on_file: F) -> ExtractStats
    where
        F: FnMut(&Path),
    {
        let mut stats = ExtractStats::default();

        for (path, error) in &plan.walk_errors {
            tracing::warn!("Cannot visit {}: {}", path.display(), error);
            stats.failure(path, error);
            on_file(path);
        }

        for file in &plan.files {
            let out_path = Self::output_path(&plan.root, file, out_root);
            match self.extract_one(file, &out_path) {
                Ok(warnings) => {
                    stats.ok += 1;
                    for warning in warnings {
                        tracing::warn!("{}: {}", file.display(), warning);
                        stats.warnings.push(FileWarning {
                            input: file.display().to_string(),
                            warning,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to extract {}: {}", file.display(), e);
                    stats.failure(file, e);
                }
            }
            on_file(file);
        }

        tracing::info!(
            "Extraction finished: {} ok, {} failed, {} warnings",
            stats.ok,
            stats.fail,
            stats.warnings.len()
        );
        stats
    }

    fn extract_one(&self, file: &Path, out_path: &Path) -> Result<Vec<String>> {
        let extracted = self.registry.extract(file)?;
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out_path, extracted.text.as_bytes())?;
        tracing::debug!("{} -> {}", file.display(), out_path.display());
        Ok(extracted.warnings)
    }
}

impl Default for BatchExtractor {
    fn default() -> Self {
        Self::new(ExtractorRegistry::default())
    }
}
