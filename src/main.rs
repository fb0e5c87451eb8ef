use clap::Parser;
use shipment_sync::core::ShipmentSource;
use shipment_sync::utils::{logger, validation::Validate};
use shipment_sync::{
    CliConfig, FileSource, HttpOrderService, ShipmentProcessor, SyncConfig, SyncEngine,
};

const EXIT_BATCH_ERRORS: i32 = 1;
const EXIT_SETUP_ERROR: i32 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting shipment-sync");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match SyncConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            std::process::exit(EXIT_SETUP_ERROR);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(EXIT_SETUP_ERROR);
    }

    tracing::info!(
        "✅ Configuration loaded: {} stores, {} reserved orders",
        config.stores.len(),
        config.sync.reserved_orders.len()
    );

    let source = FileSource::new(&args.input).with_dedupe(config.dedupe_records());
    let service = HttpOrderService::with_timeout(config.request_timeout())?;
    let processor = ShipmentProcessor::new(service, config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no store APIs will be called");
        let entries = match source.load().await {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("❌ Failed to read shipments from '{}': {}", args.input, e);
                std::process::exit(EXIT_SETUP_ERROR);
            }
        };
        let plan = processor.plan(&entries);
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let engine = SyncEngine::new(source, processor);
    let report = match engine.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("❌ Shipment sync failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_SETUP_ERROR);
        }
    };

    println!("{}", serde_json::to_string_pretty(&report.results)?);

    if let Some(failure) = report.failure() {
        eprintln!("❌ {}", failure);
        std::process::exit(EXIT_BATCH_ERRORS);
    }

    tracing::info!("✅ All shipments processed successfully");
    Ok(())
}
