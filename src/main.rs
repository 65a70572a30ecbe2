use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use slice_runner::config::cli::{Command, ProfilesCommand, SliceArgs};
use slice_runner::core::{ProfileCatalogue, ProfileCategory, ServiceConfig, SliceMetadata};
use slice_runner::utils::error::ErrorSeverity;
use slice_runner::utils::{logger, validation::Validate};
use slice_runner::{
    Cli, FsProfileCatalogue, SliceError, SliceSettings, SlicingOrchestrator, SystemProcessRunner,
    TomlConfig,
};
use std::sync::Arc;

#[derive(Serialize)]
struct SliceReport<'a> {
    file_name: &'a str,
    content_type: &'a str,
    metadata: SliceMetadata,
    sliced_at: chrono::DateTime<chrono::Utc>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 載入配置
    let (mut settings, json_logs, level) = match &cli.config {
        Some(path) => {
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("Failed to load config file '{}'", path.display()))?;
            config.validate().context("Invalid configuration")?;
            let json = config.is_json_logging();
            let level = config.log_level().map(str::to_string);
            (config.into_settings(), json, level)
        }
        None => (SliceSettings::from_env()?, false, None),
    };

    // 初始化日誌
    if cli.json_logs || json_logs {
        logger::init_json_logger(level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting slice-runner");

    let outcome = match &cli.command {
        Command::Slice(args) => {
            args.apply_overrides(&mut settings);
            run_slice(args, &settings).await
        }
        Command::Profiles { command } => run_profiles(command, &settings).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run_slice(args: &SliceArgs, settings: &SliceSettings) -> Result<(), SliceError> {
    settings.validate()?;
    tracing::debug!("Settings: {:?}", settings);

    let catalogue = Arc::new(FsProfileCatalogue::new(settings.data_path()));
    let runner = Arc::new(SystemProcessRunner::new(settings.engine_timeout()));
    let orchestrator = SlicingOrchestrator::from_config(settings, catalogue, runner);

    let request = args.to_request().await?;
    let response = orchestrator.slice(request).await?;

    tokio::fs::create_dir_all(&args.output).await?;
    let target = args.output.join(response.file_name());
    let headers = response.headers();
    let report = serde_json::to_string_pretty(&SliceReport {
        file_name: response.file_name(),
        content_type: response.content_type(),
        metadata: *response.metadata(),
        sliced_at: chrono::Utc::now(),
    })?;

    let mut file = tokio::fs::File::create(&target).await?;
    let bytes = response.deliver(&mut file).await?;

    println!("✅ Slicing completed successfully!");
    println!("📁 Output saved to: {} ({} bytes)", target.display(), bytes);
    for (name, value) in headers {
        println!("   {}: {}", name, value);
    }

    if let Some(report_path) = &args.report {
        tokio::fs::write(report_path, report).await?;
        println!("📝 Report written to: {}", report_path.display());
    }

    Ok(())
}

async fn run_profiles(command: &ProfilesCommand, settings: &SliceSettings) -> Result<(), SliceError> {
    let catalogue = FsProfileCatalogue::new(settings.data_path());

    match command {
        ProfilesCommand::List { category } => {
            let category: ProfileCategory = category.parse()?;
            for name in catalogue.list_names(category).await? {
                println!("{}", name);
            }
        }
        ProfilesCommand::Show { category, name } => {
            let category: ProfileCategory = category.parse()?;
            let document = catalogue.read_document(category, name).await?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }

    Ok(())
}
