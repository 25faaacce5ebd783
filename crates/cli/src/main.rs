use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "parley", about = "Parley — anonymous 1:1 stranger-chat gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Gateway {
        /// Bind address; overrides the config file when given.
        #[arg(long)]
        bind: Option<String>,
        /// Listen port; overrides the config file when given.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration.
    Config,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "parley starting");

    let config = parley_config::discover_and_load();
    match cli.command {
        Commands::Gateway { bind, port } => {
            let bind = bind.unwrap_or_else(|| config.gateway.bind.clone());
            let port = port.unwrap_or(config.gateway.port);
            parley_gateway::server::start_gateway(&bind, port, &config).await
        },
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
    }
}
