use anyhow::Context;
use clap::Parser;
use courier_quote::config::Command;
use courier_quote::core::geo::route_estimate;
use courier_quote::core::onboarding::{Onboarding, SLIDES};
use courier_quote::domain::catalogue::services;
use courier_quote::domain::model::QuoteRequest;
use courier_quote::domain::ports::{ConfigProvider, PositionOptions};
use courier_quote::utils::error::ErrorSeverity;
use courier_quote::utils::{logger, validation::Validate};
use courier_quote::{
    CliConfig, ConfiguredPosition, LocalStorage, LocationResolver, NominatimGeocoder, QuoteError,
    QuoteFlow, QuoteWizard, SimulatedSubmitter, TomlConfig,
};

type Resolver = LocationResolver<NominatimGeocoder, ConfiguredPosition>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting courier-quote CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e).max(1));
        }
    };

    if let Err(e) = show_onboarding(&config).await {
        tracing::warn!("⚠️ Skipping onboarding: {:#}", e);
    }

    if let Err(e) = run(cli.command, &config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}

fn exit_code(e: &QuoteError) -> i32 {
    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn load_config(cli: &CliConfig) -> courier_quote::Result<TomlConfig> {
    let config = TomlConfig::load_or_default(&cli.config)?;
    config.validate()?;
    tracing::debug!("Loaded configuration from {}", cli.config.display());
    Ok(config)
}

async fn show_onboarding(config: &TomlConfig) -> anyhow::Result<()> {
    let storage = LocalStorage::new(config.state_dir());
    let mut onboarding = Onboarding::load(storage)
        .await
        .context("reading onboarding flag")?;
    if !onboarding.should_show() {
        return Ok(());
    }

    for (index, slide) in SLIDES.iter().enumerate() {
        eprintln!("[{}/{}] {}", index + 1, SLIDES.len(), slide.title);
        eprintln!("      {}", slide.description);
    }
    eprintln!();

    onboarding
        .complete()
        .await
        .with_context(|| format!("writing onboarding flag under {}", config.state_dir()))?;
    Ok(())
}

fn build_resolver(config: &TomlConfig) -> courier_quote::Result<Resolver> {
    let geocoder = NominatimGeocoder::from_config(config)?;
    let options = PositionOptions {
        timeout: config.device_timeout(),
        ..PositionOptions::default()
    };
    Ok(LocationResolver::new(geocoder, ConfiguredPosition::from_config(config))
        .with_position_options(options))
}

async fn run(command: Command, config: &TomlConfig) -> courier_quote::Result<()> {
    match command {
        Command::Services => {
            for service in services() {
                println!("{:>2}. {:<22} {}", service.id, service.title, service.description);
            }
        }
        Command::Distance { from, to } => {
            let route = route_estimate(from, to, config.average_speed_kmh());
            println!("📏 Distance: {}", route.formatted_distance());
            println!("⏱️ Duration: {}", route.formatted_duration());
            println!("🎯 Midpoint: {}", route.midpoint);
        }
        Command::Geocode { query } => {
            let resolver = build_resolver(config)?;
            let selection = resolver.forward_geocode(&query.join(" ")).await?;
            println!("📍 {}", selection.address);
            println!("   {}", selection.point);
        }
        Command::Reverse { point } => {
            let resolver = build_resolver(config)?;
            let selection = resolver.reverse_geocode(point).await;
            println!("📍 {}", selection.address);
        }
        Command::Quote(args) => {
            let submitter = SimulatedSubmitter::new(config.submission_delay())
                .with_prefix(config.reference_prefix());
            let wizard = QuoteWizard::new().with_average_speed(config.average_speed_kmh());
            let mut flow = QuoteFlow::new(build_resolver(config)?, submitter, wizard);

            let request = flow.prepare(args.into_inputs()).await?;
            print_review(request);

            let quote = flow.submit().await?;
            let summary = quote.summary();
            println!();
            println!("✅ Quote request submitted!");
            println!("   Reference: {}", summary.reference);
            println!("   {} on {} at {}", summary.service, summary.date, summary.time);
            println!("   {} -> {}", summary.pickup_location, summary.dropoff_location);
        }
    }
    Ok(())
}

fn print_review(request: &QuoteRequest) {
    let package = &request.package;
    println!("📋 Review your quote");
    println!("   Service:   {}", request.service.title);
    println!("   Pickup:    {}", request.pickup.address);
    println!("   Dropoff:   {}", request.dropoff.address);
    println!(
        "   Route:     {} (about {})",
        request.route.formatted_distance(),
        request.route.formatted_duration()
    );
    println!(
        "   When:      {} at {}",
        package.pickup_date.format("%A, %-d %B %Y"),
        package.pickup_time.format("%H:%M")
    );
    println!("   Size:      {}", package.size.label());
    println!("   Weight:    {}", package.weight.label());
    println!("   Packaging: {}", package.package_type.label());
    if let Some(notes) = &package.special_instructions {
        println!("   Notes:     {}", notes);
    }
}
