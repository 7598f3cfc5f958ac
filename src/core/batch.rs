//! Administrator batch import of curated JSON reading lists.
//!
//! Each file is imported under [`ImportPolicy::strict`]; a file that fails
//! is reported and the run moves on to the next one.

use crate::core::importer::{run_import, ImportOutcome, ImportPolicy, ImportRequest};
use crate::core::json_batch::load_batch_file;
use crate::domain::model::User;
use crate::domain::ports::{CatalogLookup, ReadingListStore, UserDirectory};
use crate::utils::error::{ReadingListError, Result};
use crate::utils::validation::has_extension;
use std::path::{Path, PathBuf};

pub const DEFAULT_SYSTEM_USER: &str = "Metron";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub dry_run: bool,
    pub skip_missing: bool,
    pub system_user: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_missing: false,
            system_user: DEFAULT_SYSTEM_USER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Created {
        name: String,
        issues_added: usize,
        issues_missing: usize,
    },
    WouldCreate {
        name: String,
        issues: usize,
    },
    Skipped {
        name: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub dry_run: bool,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    /// dry-run 時「預計建立」也算在內
    pub fn created(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    FileOutcome::Created { .. } | FileOutcome::WouldCreate { .. }
                )
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Skipped { .. }))
            .count()
    }

    pub fn errors(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(50));
        if self.dry_run {
            println!("⚠️  DRY RUN - No changes were made");
        }
        println!("✅ Successfully processed: {} reading list(s)", self.created());
        if self.skipped() > 0 {
            println!("⏭️  Skipped (already exists): {} reading list(s)", self.skipped());
        }
        if self.errors() > 0 {
            println!("❌ Errors: {} reading list(s)", self.errors());
        }
    }
}

/// 收集要匯入的 JSON 檔案
///
/// 目錄只取其中的 `*.json`（依檔名排序）；直接指定的非 JSON 檔案會被略過。
pub fn collect_batch_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(ReadingListError::FileNotFound { path: path.clone() });
        }

        if path.is_file() {
            if has_extension(path, "json") {
                files.push(path.clone());
            } else {
                tracing::warn!("⚠️  Skipping non-JSON file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_extension(p, "json"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            return Err(ReadingListError::validation(format!(
                "Invalid path: {}",
                path.display()
            )));
        }
    }

    if files.is_empty() {
        return Err(ReadingListError::validation("No JSON files found to import"));
    }

    Ok(files)
}

pub struct BatchImporter<'s, S> {
    store: &'s mut S,
    options: BatchOptions,
}

impl<'s, S> BatchImporter<'s, S>
where
    S: ReadingListStore + CatalogLookup + UserDirectory,
{
    pub fn new(store: &'s mut S, options: BatchOptions) -> Self {
        Self { store, options }
    }

    /// 找不到系統帳號時整批中止，不處理任何檔案
    fn system_user(&self) -> Result<User> {
        self.store
            .find_user_by_username(&self.options.system_user)?
            .ok_or_else(|| ReadingListError::MissingConfigError {
                field: format!(
                    "system user \"{}\" (please create this user first)",
                    self.options.system_user
                ),
            })
    }

    pub fn run(&mut self, paths: &[PathBuf]) -> Result<BatchSummary> {
        let owner = self.system_user()?;
        let files = collect_batch_files(paths)?;
        tracing::info!("📂 Found {} JSON file(s) to import", files.len());

        let policy = ImportPolicy::strict(self.options.skip_missing, self.options.dry_run);
        let mut summary = BatchSummary {
            dry_run: self.options.dry_run,
            reports: Vec::with_capacity(files.len()),
        };

        for file in files {
            let outcome = match self.import_file(&file, &owner, &policy) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        "❌ Error importing {}: {}",
                        file.display(),
                        e.user_friendly_message()
                    );
                    FileOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            summary.reports.push(FileReport {
                path: file,
                outcome,
            });
        }

        tracing::info!(
            "Batch finished: {} created, {} skipped, {} error(s)",
            summary.created(),
            summary.skipped(),
            summary.errors()
        );
        Ok(summary)
    }

    fn import_file(&mut self, path: &Path, owner: &User, policy: &ImportPolicy) -> Result<FileOutcome> {
        tracing::info!("Processing: {}", path.display());
        let batch = load_batch_file(path)?;

        let request = ImportRequest {
            name: batch.name,
            owner: owner.clone(),
            is_private: false,
            attribution_source: batch.attribution_source,
            attribution_url: String::new(),
            books: batch.books,
        };

        let outcome = match run_import(&mut *self.store, request, policy)? {
            ImportOutcome::Created(result) => {
                tracing::info!(
                    "✅ Created reading list: {} with {} issue(s)",
                    result.reading_list.name,
                    result.issues_added
                );
                if let Some(source) = result.reading_list.attribution_source {
                    tracing::info!("   Attribution source: {}", source.label());
                }
                FileOutcome::Created {
                    name: result.reading_list.name,
                    issues_added: result.issues_added,
                    issues_missing: result.issues_not_found.len(),
                }
            }
            ImportOutcome::DryRun(preview) => {
                if let Some(source) = preview.attribution_source {
                    tracing::info!("   Attribution source: {}", source.code());
                }
                FileOutcome::WouldCreate {
                    name: preview.name,
                    issues: preview.issues_to_add,
                }
            }
            ImportOutcome::SkippedExisting { name } => FileOutcome::Skipped { name },
        };

        Ok(outcome)
    }
}
