pub mod toml_config;

pub use toml_config::ImporterSettings;

#[cfg(feature = "cli")]
use crate::core::batch::BatchOptions;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_non_empty_string, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// 管理者批次匯入的命令列參數
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "import-reading-lists")]
#[command(about = "Import reading lists from JSON files, assigning ownership to the system user")]
pub struct CliConfig {
    /// Path(s) to JSON file(s) or directories containing JSON files
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    #[arg(long, help = "Simulate import without making changes")]
    pub dry_run: bool,

    #[arg(
        long,
        help = "Skip issues that don't exist in the database instead of failing"
    )]
    pub skip_missing: bool,

    #[arg(long, help = "Reading list store file (overrides the settings file)")]
    pub store: Option<PathBuf>,

    #[arg(long, help = "Optional TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Account that owns imported lists")]
    pub system_user: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 合併設定檔與命令列參數；命令列優先
    pub fn settings(&self) -> Result<ImporterSettings> {
        let mut settings = match &self.config {
            Some(path) => ImporterSettings::from_file(path)?,
            None => ImporterSettings::default(),
        };

        if let Some(store) = &self.store {
            settings.store.path = store.display().to_string();
        }
        if let Some(user) = &self.system_user {
            settings.import.system_user = Some(user.clone());
        }
        if self.skip_missing {
            settings.import.skip_missing = Some(true);
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn batch_options(&self, settings: &ImporterSettings) -> BatchOptions {
        BatchOptions {
            dry_run: self.dry_run,
            skip_missing: settings.skip_missing(),
            system_user: settings.system_user().to_string(),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(user) = &self.system_user {
            validate_non_empty_string("system_user", user)?;
        }
        Ok(())
    }
}
