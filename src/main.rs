use clap::Parser;
use reading_list_import::utils::error::{ErrorSeverity, ReadingListError};
use reading_list_import::utils::{logger, validation::Validate};
use reading_list_import::{BatchImporter, CliConfig, JsonFileStore};

fn exit_code(e: &ReadingListError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 輸入錯誤
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn fail(e: ReadingListError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Batch import failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(exit_code(&e).max(1));
}

fn main() {
    let config = CliConfig::parse();

    let settings = match config.settings() {
        Ok(settings) => settings,
        Err(e) => {
            logger::init_cli_logger(config.verbose);
            fail(e);
        }
    };

    // 初始化日誌
    let verbose = config.verbose || settings.verbose();
    if config.json_logs || settings.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting reading list batch import");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        fail(e);
    }

    let store_path = settings.store_path();
    tracing::info!("📁 Using store: {}", store_path.display());
    let mut store = match JsonFileStore::open(&store_path) {
        Ok(store) => store,
        Err(e) => fail(e),
    };

    let options = config.batch_options(&settings);
    if options.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no changes will be written");
    }

    let summary = match BatchImporter::new(&mut store, options).run(&config.paths) {
        Ok(summary) => summary,
        Err(e) => fail(e),
    };

    summary.print_summary();

    for report in &summary.reports {
        tracing::debug!("{}: {:?}", report.file_name(), report.outcome);
    }

    if summary.errors() > 0 {
        std::process::exit(2);
    }
}
