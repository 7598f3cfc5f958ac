use clap::{Args, Parser, Subcommand};
use reading_list_import::core::editor::{EditSummary, ReadingListEditor};
use reading_list_import::core::placement::Position;
use reading_list_import::core::reorder::parse_issue_order;
use reading_list_import::domain::ports::UserDirectory;
use reading_list_import::utils::error::{ReadingListError, Result};
use reading_list_import::utils::logger;
use reading_list_import::JsonFileStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reading-list-editor")]
#[command(about = "Add issues to an existing reading list and reorder it")]
struct Cli {
    /// Reading list store file
    #[arg(long, global = true, default_value = "./reading-lists.json")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Target {
    /// Slug of the reading list to edit
    #[arg(long)]
    list: String,

    /// Username of the list owner
    #[arg(long)]
    owner: String,
}

#[derive(Subcommand)]
enum Command {
    /// Add selected issues and optionally reorder the whole list
    Add {
        #[command(flatten)]
        target: Target,

        /// Comma-separated issue ids to add
        #[arg(long)]
        issues: String,

        /// Comma-separated final order of issue ids (existing and new)
        #[arg(long, default_value = "")]
        order: String,
    },
    /// Add issues from a series, optionally limited to a number range
    Series {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        series: i64,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(long, default_value = "end")]
        position: Position,
    },
    /// Add every issue of a story arc
    Arc {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        arc: i64,

        #[arg(long, default_value = "end")]
        position: Position,
    },
}

impl Command {
    fn target(&self) -> &Target {
        match self {
            Command::Add { target, .. }
            | Command::Series { target, .. }
            | Command::Arc { target, .. } => target,
        }
    }
}

fn run(cli: &Cli) -> Result<EditSummary> {
    let mut store = JsonFileStore::open(&cli.store)?;
    let target = cli.command.target();
    let owner = store
        .find_user_by_username(&target.owner)?
        .ok_or_else(|| ReadingListError::not_found("User", &target.owner))?;

    let mut editor = ReadingListEditor::open(&mut store, &target.list, &owner)?;
    tracing::info!("✏️  Editing '{}'", editor.reading_list().name);

    match &cli.command {
        Command::Add { issues, order, .. } => {
            let selected = parse_issue_order(issues)?;
            editor.add_issues(&selected, order)
        }
        Command::Series {
            series,
            start,
            end,
            position,
            ..
        } => editor.add_from_series(*series, start.as_deref(), end.as_deref(), *position),
        Command::Arc { arc, position, .. } => editor.add_from_arc(*arc, *position),
    }
}

fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    match run(&cli) {
        Ok(summary) => {
            if summary.has_changes() {
                println!("✅ {}", summary.message());
            } else {
                println!("ℹ️  {}", summary.message());
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Edit failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }
}
