use clap::Parser;
use testflux::cli::{Cli, Commands};
use testflux::types::config::Config;
use testflux::TestfluxResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> TestfluxResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|_| Config::default_config())
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("testflux={}", log_level)
            .parse()
            .unwrap_or_else(|_| "testflux=info".parse().expect("fallback directive is valid")),
    );

    let json = config.general.log_format.eq_ignore_ascii_case("json");
    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            testflux::cli::commands::init(path).await?;
        }
        Commands::Resolve {
            manifest,
            class,
            json,
        } => {
            testflux::cli::commands::resolve(&manifest, class.as_deref(), json, &config).await?;
        }
        Commands::Build {
            manifest,
            class,
            json,
        } => {
            testflux::cli::commands::build(&manifest, class.as_deref(), json, &config).await?;
        }
        Commands::Version => {
            testflux::cli::commands::version();
        }
    }

    Ok(())
}
