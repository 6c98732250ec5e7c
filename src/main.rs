mod cli;
mod logging;

use anyhow::Context;
use cli::{Args, Command, ScanArgs};
use owo_colors::OwoColorize;
use sbom_vuln_scanner::adapters::outbound::console::StderrProgressReporter;
use sbom_vuln_scanner::adapters::outbound::filesystem::{FileSystemReader, NvdFeedFile};
use sbom_vuln_scanner::adapters::outbound::network::NvdClient;
use sbom_vuln_scanner::adapters::outbound::queue::ScanWorkerPool;
use sbom_vuln_scanner::adapters::outbound::storage::InMemoryScanStore;
use sbom_vuln_scanner::application::dto::{ScanOutcome, UploadStatus};
use sbom_vuln_scanner::application::factories::{FormatterFactory, PresenterFactory};
use sbom_vuln_scanner::application::read_models::ScanReport;
use sbom_vuln_scanner::application::use_cases::{
    BuildScanReportUseCase, IngestVulnerabilitiesUseCase, RefreshScannerDbUseCase,
    RunScanUseCase, SubmitSbomUseCase,
};
use sbom_vuln_scanner::config::{self, Settings};
use sbom_vuln_scanner::ports::outbound::{
    DbRefreshStatus, ExternalScanner, ProgressReporter, SbomReader, VulnerabilityFeed,
};
use sbom_vuln_scanner::shared::error::ExitCode;
use sbom_vuln_scanner::shared::Result;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            ExitCode::ApplicationError
        }
    };
    process::exit(code.as_i32());
}

async fn run() -> Result<ExitCode> {
    // clap exits with status 2 on invalid arguments
    let args = Args::parse_args();

    let config_file = match args.config.as_deref() {
        Some(path) => Some(config::load_config_from_path(path)?),
        None => config::discover_config(&std::env::current_dir()?)?,
    };
    let settings = Settings::from_file(config_file.as_ref())?;
    logging::init_tracing(&settings.log_level, settings.log_format)?;
    if let Some(file) = config_file.as_ref() {
        config::warn_unknown_fields(file);
    }

    match args.command {
        Command::Scan(scan_args) => scan(scan_args, settings).await,
        Command::RefreshDb { watch: false } => refresh_db(settings).await,
        Command::RefreshDb { watch: true } => watch_db(settings).await,
        Command::CheckTool => check_tool(settings).await,
    }
}

async fn scan(args: ScanArgs, mut settings: Settings) -> Result<ExitCode> {
    if let Some(engine) = args.engine {
        settings.engine = engine;
    }

    let reporter = StderrProgressReporter::new();
    let store = InMemoryScanStore::new();

    // Step 1: Read the upload
    let request = FileSystemReader::new().read_sbom(&args.file, settings.max_upload_bytes)?;

    // Step 2: Load vulnerability data for the built-in matcher
    if let Some(feed_path) = args.feed.as_ref() {
        ingest(&store, NvdFeedFile::new(feed_path), &reporter).await?;
    }
    if args.fetch_nvd {
        let client = NvdClient::new(settings.nvd.api_key.clone(), settings.nvd.window_days)?;
        ingest(&store, client, &reporter).await?;
    }

    // Step 3: Submit and wait for the worker pool to finish the job
    let run_scan = RunScanUseCase::new(
        store.clone(),
        Some(settings.scanner.build_scanner()),
        settings.engine,
        settings.scan_timeouts(),
    );
    let (queue, mut pool) = ScanWorkerPool::start(Arc::new(run_scan), settings.workers);
    let submit = SubmitSbomUseCase::new(store.clone(), queue, settings.max_upload_bytes);

    let receipt = submit.execute(request).await?;
    reporter.report(&format!(
        "📄 {} ({}, {} components)",
        receipt.filename, receipt.format, receipt.component_count
    ));
    if receipt.scan_status == UploadStatus::Rescanning {
        reporter.report("   Identical document already known, rescanning");
    }

    reporter.report_activity(&format!("🔍 Scanning with the {} engine...", settings.engine));
    let outcome = pool
        .next_outcome()
        .await
        .context("Scan worker pool stopped before the scan finished")?;
    drop(submit);
    pool.shutdown().await;

    if let ScanOutcome::Failed { error, .. } = &outcome {
        reporter.report_error(&format!("❌ Scan failed: {}", error));
        anyhow::bail!("Scan of {} failed: {}", args.file.display(), error);
    }
    reporter.report_completion("✅ Scan completed");

    // Step 4: Build, format and present the report
    let report = BuildScanReportUseCase::new(store)
        .execute(receipt.sbom_id)
        .await?
        .context("No scan result recorded for the submitted SBOM")?;

    reporter.report(FormatterFactory::progress_message(args.format));
    let output = FormatterFactory::create(args.format).format(&report)?;
    PresenterFactory::create(args.output.into()).present(&output)?;

    print_summary(&report);

    if report.scan.vulnerable_count > 0 {
        Ok(ExitCode::VulnerabilitiesDetected)
    } else {
        Ok(ExitCode::Success)
    }
}

async fn ingest<F: VulnerabilityFeed>(
    store: &InMemoryScanStore,
    feed: F,
    reporter: &StderrProgressReporter,
) -> Result<()> {
    let stats = IngestVulnerabilitiesUseCase::new(store.clone(), feed, reporter)
        .execute()
        .await?;
    tracing::info!(
        total_fetched = stats.total_fetched,
        new = stats.new_count,
        updated = stats.updated_count,
        failed = stats.failed_count,
        "vulnerability feed loaded"
    );
    Ok(())
}

async fn refresh_db(settings: Settings) -> Result<ExitCode> {
    let reporter = StderrProgressReporter::new();
    let use_case = RefreshScannerDbUseCase::new(
        settings.scanner.build_scanner(),
        settings.scanner.db_refresh_timeout,
    );

    reporter.report_activity("🔄 Refreshing scanner vulnerability database...");
    let status = use_case.execute().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    match status {
        DbRefreshStatus::Success { .. } => {
            reporter.report_completion("✅ Scanner database refreshed");
            Ok(ExitCode::Success)
        }
        DbRefreshStatus::Failed { error, .. } => {
            reporter.report_error(&format!("❌ Database refresh failed: {}", error));
            Ok(ExitCode::ApplicationError)
        }
    }
}

async fn watch_db(settings: Settings) -> Result<ExitCode> {
    let use_case = RefreshScannerDbUseCase::new(
        settings.scanner.build_scanner(),
        settings.scanner.db_refresh_timeout,
    );
    let interval = settings.scanner.db_refresh_interval;

    eprintln!(
        "🔄 Refreshing scanner database every {}s (Ctrl-C to stop)",
        interval.as_secs()
    );
    let runs = use_case
        .run_every(interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
            }
        })
        .await;
    eprintln!("Stopped after {} refresh run(s)", runs);
    Ok(ExitCode::Success)
}

async fn check_tool(settings: Settings) -> Result<ExitCode> {
    let scanner = settings.scanner.build_scanner();
    if scanner.is_available().await {
        eprintln!(
            "{} {} is available",
            "✓".green().bold(),
            settings.scanner.command
        );
        Ok(ExitCode::Success)
    } else {
        eprintln!(
            "{} {} is not installed or not executable\n\n💡 Hint: Install Trivy or set scanner.command in {}.",
            "✗".red().bold(),
            settings.scanner.command,
            config::CONFIG_FILENAME
        );
        Ok(ExitCode::ApplicationError)
    }
}

fn print_summary(report: &ScanReport) {
    let scan = &report.scan;
    let counts = &scan.severity_counts;

    eprintln!();
    eprintln!("{}", "Scan summary".bold());
    eprintln!(
        "  Components: {} total, {} vulnerable",
        scan.total_components, scan.vulnerable_count
    );
    eprintln!(
        "  Findings:   {} {}  {} {}  {} {}  {} {}",
        counts.critical.to_string().red().bold(),
        "critical".red(),
        counts.high.to_string().bright_red(),
        "high".bright_red(),
        counts.medium.to_string().yellow(),
        "medium".yellow(),
        counts.low.to_string().blue(),
        "low".blue(),
    );
    eprintln!("  Risk level: {}", report.risk.risk_level.bold());
    for recommendation in &report.risk.recommendations {
        eprintln!("  • {}", recommendation);
    }
}
