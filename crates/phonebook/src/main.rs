//! Phonebook - entry point

use std::path::PathBuf;

use anyhow::Context as _;
use tracing::{error, info};

use phonebook::{bootstrap, ConfigLoader, PhonebookConfig, ENV_PREFIX, VERSION};
use phonebook_telemetry::init_logging;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "phonebook.toml";

/// Command-line arguments.
struct Args {
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => config = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("--config requires a path");
                        std::process::exit(1);
                    }
                },
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("phonebook {VERSION}");
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Phonebook - contact list REST service

USAGE:
    phonebook [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
                           [default: ./phonebook.toml if present]
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    PORT                                 Listen port (keeps the configured host)
    PHONEBOOK__SERVER__HTTP_ADDR         Bind address (default: 0.0.0.0:3001)
    PHONEBOOK__SERVER__MAX_BODY_SIZE     Request body limit in bytes (default: 102400)
    PHONEBOOK__STORAGE__BACKEND          memory | file (default: memory)
    PHONEBOOK__STORAGE__PATH             Contact file for the file backend
    PHONEBOOK__STATIC_FILES__ROOT        Frontend bundle directory (default: dist)
    PHONEBOOK__CORS__ALLOWED_ORIGINS     Comma-separated origins (default: *)
    PHONEBOOK__LOGGING__LEVEL            Log filter (default: info)
    PHONEBOOK__LOGGING__FORMAT           json | pretty (default: json)

Variables may also be placed in a .env file in the working directory.
"
    );
}

fn load_config(args: &Args) -> anyhow::Result<PhonebookConfig> {
    let loader = ConfigLoader::new().with_dotenv()?;

    let loader = match &args.config {
        Some(path) => loader
            .with_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };

    Ok(loader.with_env_prefix(ENV_PREFIX).load()?)
}

async fn run(config: PhonebookConfig) -> anyhow::Result<()> {
    info!(version = VERSION, "Starting phonebook");

    let server = bootstrap(&config).await?;
    server.run().await.context("server error")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}
