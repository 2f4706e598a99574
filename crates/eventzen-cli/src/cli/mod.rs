//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use eventzen_core::config;
use eventzen_core::logging::{self, LogTarget};

mod commands;

#[derive(Parser)]
#[command(name = "eventzen")]
#[command(version = "0.1")]
#[command(about = "EventZen terminal shell: find events near you")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Detect the current city and state and print it
    Locate {
        /// Latitude to use instead of the configured location source
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to use instead of the configured location source
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
    /// Submit a search query
    Search {
        /// Text to search for
        #[arg(value_name = "QUERY", required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Sign in with a federated provider or email and password
    Login {
        /// Sign in with Google (opens a browser)
        #[arg(long, conflicts_with_all = ["apple", "email"])]
        google: bool,

        /// Sign in with Apple (opens a browser)
        #[arg(long, conflicts_with = "email")]
        apple: bool,

        /// Sign in with this email address (password read from EVENTZEN_PASSWORD)
        #[arg(long, value_name = "ADDRESS")]
        email: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load().context("load config")?;

    // The shell owns the screen, so its records go to a file.
    let target = if cli.command.is_none() {
        LogTarget::File(config::paths::logs_dir())
    } else {
        LogTarget::Stderr
    };
    let _log_guard = logging::init(target).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    let Some(command) = cli.command else {
        // The shell loop is synchronous; its handlers spawn onto this runtime.
        let _enter = rt.enter();
        return commands::shell::run(&config);
    };

    rt.block_on(dispatch(command, &config))
}

async fn dispatch(command: Commands, config: &config::Config) -> Result<()> {
    match command {
        Commands::Locate { lat, lon } => {
            let coords = lat.zip(lon);
            commands::locate::run(config, coords).await
        }

        Commands::Search { query } => commands::search::run(&query.join(" ")),

        Commands::Login {
            google,
            apple,
            email,
        } => {
            let password = std::env::var(commands::login::PASSWORD_ENV).ok();
            let method = commands::login::method_from_flags(google, apple, email, password)?;
            commands::login::run(config, method).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
