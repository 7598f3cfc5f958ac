use clap::Parser;
use reading_list_import::core::importer::{import_cbl_file, CblImportOptions};
use reading_list_import::domain::model::{AttributionSource, ImportResult};
use reading_list_import::domain::ports::UserDirectory;
use reading_list_import::utils::error::{ReadingListError, Result};
use reading_list_import::utils::logger;
use reading_list_import::JsonFileStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cbl-import")]
#[command(about = "Import a Comic Book List (.cbl) file as a reading list")]
struct Args {
    /// Path to the .cbl file
    file: PathBuf,

    /// Username of the list owner
    #[arg(long)]
    owner: String,

    /// Create the list as private
    #[arg(long)]
    private: bool,

    /// Attribution source code (CBRO, CMRO, CBH, CBT, MG, HTLC, LOCG, OTHER)
    #[arg(long)]
    source: Option<String>,

    /// Attribution URL
    #[arg(long, default_value = "")]
    url: String,

    /// Reading list store file
    #[arg(long, default_value = "./reading-lists.json")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<ImportResult> {
    let attribution_source = match args.source.as_deref() {
        None | Some("") => None,
        Some(code) => Some(AttributionSource::from_code(code).ok_or_else(|| {
            ReadingListError::InvalidConfigValueError {
                field: "source".to_string(),
                value: code.to_string(),
                reason: "Unknown attribution source code".to_string(),
            }
        })?),
    };

    let mut store = JsonFileStore::open(&args.store)?;
    let owner = store
        .find_user_by_username(&args.owner)?
        .ok_or_else(|| ReadingListError::not_found("User", &args.owner))?;

    let options = CblImportOptions {
        is_private: args.private,
        attribution_source,
        attribution_url: args.url.clone(),
    };

    import_cbl_file(&mut store, &args.file, &owner, &options)
}

fn print_report(result: &ImportResult) {
    println!(
        "✅ Successfully imported '{}': {} issue(s) added",
        result.reading_list.name, result.issues_added
    );
    println!("🔗 Slug: {}", result.reading_list.slug);

    if !result.issues_not_found.is_empty() {
        println!(
            "⚠️  {} issue(s) could not be found in the database:",
            result.issues_not_found.len()
        );
        for book in &result.issues_not_found {
            println!("   - {}", book);
        }
    }

    if !result.issues_skipped.is_empty() {
        println!("⏭️  {} issue(s) were skipped:", result.issues_skipped.len());
        for (book, reason) in &result.issues_skipped {
            println!("   - {}: {}", book, reason);
        }
    }
}

fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::info!("📥 Importing {} for {}", args.file.display(), args.owner);

    match run(&args) {
        Ok(result) => print_report(&result),
        Err(e) => {
            tracing::error!(
                "❌ CBL import failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(if e.is_parse_error() { 2 } else { 1 });
        }
    }
}
