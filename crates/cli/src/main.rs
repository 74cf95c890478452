//! scdn - command-line client for Swift object storage
//!
//! Thin front end over `sc-core` and `sc-swift`: every command loads the
//! config file, builds a client and reports the outcome through the shared
//! formatter and exit codes.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use commands::Overrides;
use output::OutputConfig;

#[derive(Parser, Debug)]
#[command(name = "scdn")]
#[command(about = "Client for Swift-compatible object storage")]
#[command(version)]
struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Storage user, overriding the config file
    #[arg(long, global = true, env = "SCDN_USER")]
    user: Option<String>,

    /// Storage password, overriding the config file
    #[arg(long, global = true, env = "SCDN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the configuration file
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),

    /// Download an object
    Get(commands::get::GetArgs),

    /// Upload a local file
    Put(commands::put::PutArgs),

    /// Delete an object
    Rm(commands::rm::RmArgs),

    /// Show object size and URL
    Stat(commands::stat::StatArgs),

    /// Print the public URL of an object
    Url(commands::url::UrlArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "scdn=debug,sc_core=debug,sc_swift=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };
    let overrides = Overrides {
        user: cli.user,
        password: cli.password,
    };

    let code = match cli.command {
        Commands::Config(cmd) => commands::config::execute(cmd, overrides, output_config).await,
        Commands::Get(args) => commands::get::execute(args, overrides, output_config).await,
        Commands::Put(args) => commands::put::execute(args, overrides, output_config).await,
        Commands::Rm(args) => commands::rm::execute(args, overrides, output_config).await,
        Commands::Stat(args) => commands::stat::execute(args, overrides, output_config).await,
        Commands::Url(args) => commands::url::execute(args, overrides, output_config).await,
        Commands::Completions(args) => commands::completions::execute(args, &mut Cli::command()),
    };

    tracing::debug!(exit_code = code.as_i32(), "Command finished");
    code.into()
}
