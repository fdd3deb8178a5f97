use std::env;

use drive_sheets::{
    cli_adapter::{CliAdapter, USAGE},
    config::app_config::AppConfig,
    ports::command_handler::Command,
    prettyprint::formatter::PrettyFormatter,
    service_factory::ServiceFactory,
};
use tracing::{error, info, instrument};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Usage needs neither credentials nor a config file
    if let Ok(Command::Help) = CliAdapter::parse_args(&args) {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AppConfig::load().map_err(|report| format!("{:?}", report))?;

    setup_tracing(&config)?;
    setup_panic_hook();

    info!("Starting drive-sheets CLI");

    let cli_adapter = ServiceFactory::create_cli(&config)
        .await
        .map_err(|report| format!("{:?}", report))?;

    match cli_adapter.run(args).await {
        Ok(_) => {
            info!("CLI execution completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("CLI execution failed: {:?}", e);
            Err(e)
        }
    }
}

fn setup_tracing(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let indicatif_layer = IndicatifLayer::new();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(true))
        .with_writer(indicatif_layer.get_stderr_writer());

    let log_file_layer = tracing_subscriber::fmt::layer()
        .event_format(PrettyFormatter::new(false))
        .with_writer(std::fs::File::create(&config.logging.file)?)
        .with_ansi(false);

    Registry::default()
        .with(
            tracing_subscriber::filter::Targets::new()
                .with_target("drive_sheets", tracing::Level::TRACE),
        )
        .with(indicatif_layer)
        .with(log_file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

fn setup_panic_hook() {
    tracing::trace!("Setting panic hook");
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {info}");
    }));
}
