pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryStore, JsonFileStore, StoreSnapshot};
pub use config::ImporterSettings;
pub use core::batch::{BatchImporter, BatchOptions, BatchSummary};
pub use core::editor::{EditSummary, ReadingListEditor};
pub use core::importer::{import_cbl_file, run_import, CblImportOptions, ImportPolicy};
pub use utils::error::{ReadingListError, Result};
