//! Configuration commands
//!
//! Credentials given through the global `--user`/`--password` flags (or the
//! `SCDN_USER`/`SCDN_PASSWORD` environment variables) are persisted by
//! `config set`.

use std::collections::BTreeMap;

use clap::Subcommand;
use serde::Serialize;

use super::Overrides;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use sc_core::{Config, ConfigManager};

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Update settings and save them to the config file
    Set(SetArgs),

    /// Set or remove the custom domain of a container
    Domain(DomainArgs),

    /// Print the current configuration
    Show,
}

/// Arguments for the `config set` command
#[derive(clap::Args, Debug, Default)]
pub struct SetArgs {
    /// Auth endpoint URL
    #[arg(long)]
    pub auth_url: Option<String>,

    /// Seconds before token expiry at which it is refreshed
    #[arg(long)]
    pub threshold: Option<u64>,

    /// Maximum attempts per operation (0 or 1 disables retries)
    #[arg(long)]
    pub max_retry: Option<u32>,

    /// Delay between attempts in seconds
    #[arg(long)]
    pub retry_delay: Option<f64>,

    /// Connect timeout in seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Gzip objects on upload and gunzip on download
    #[arg(long, value_name = "BOOL")]
    pub gzip: Option<bool>,

    /// Replace existing objects instead of picking a free name
    #[arg(long, value_name = "BOOL")]
    pub overwrite: Option<bool>,
}

/// Arguments for the `config domain` command
#[derive(clap::Args, Debug)]
pub struct DomainArgs {
    /// Container name
    pub container: String,

    /// Domain serving the container (e.g., `https://cdn.example.com`)
    #[arg(required_unless_present = "remove")]
    pub domain: Option<String>,

    /// Remove the container's domain
    #[arg(long, conflicts_with = "domain")]
    pub remove: bool,
}

/// Config as shown to the user, with the password redacted
#[derive(Debug, Serialize)]
struct ConfigView {
    path: String,
    user: String,
    password: String,
    auth_url: String,
    threshold_secs: u64,
    max_retry: Option<u32>,
    retry_delay_secs: f64,
    connect_timeout_secs: u64,
    use_gz: bool,
    overwrite_files: bool,
    domains: BTreeMap<String, String>,
}

impl ConfigView {
    fn new(manager: &ConfigManager, config: &Config) -> Self {
        let password = if config.client.password.is_empty() {
            String::new()
        } else {
            "***".to_string()
        };
        Self {
            path: manager.path().display().to_string(),
            user: config.client.user.clone(),
            password,
            auth_url: config.client.auth_url.clone(),
            threshold_secs: config.client.threshold_secs,
            max_retry: config.client.max_retry,
            retry_delay_secs: config.client.retry_delay_secs,
            connect_timeout_secs: config.client.connect_timeout_secs,
            use_gz: config.storage.use_gz,
            overwrite_files: config.storage.overwrite_files,
            domains: config.storage.domains.clone(),
        }
    }

    fn render(&self, formatter: &Formatter) -> String {
        const WIDTH: usize = 16;
        let max_retry = self
            .max_retry
            .map_or_else(|| "disabled".to_string(), |n| n.to_string());

        let mut lines = vec![
            formatter.field("path", &self.path, WIDTH),
            formatter.field("user", &self.user, WIDTH),
            formatter.field("password", &self.password, WIDTH),
            formatter.field("auth_url", &formatter.style_url(&self.auth_url), WIDTH),
            formatter.field("threshold", &format!("{}s", self.threshold_secs), WIDTH),
            formatter.field("max_retry", &max_retry, WIDTH),
            formatter.field("retry_delay", &format!("{}s", self.retry_delay_secs), WIDTH),
            formatter.field("connect_timeout", &format!("{}s", self.connect_timeout_secs), WIDTH),
            formatter.field("gzip", &self.use_gz.to_string(), WIDTH),
            formatter.field("overwrite", &self.overwrite_files.to_string(), WIDTH),
        ];
        for (container, domain) in &self.domains {
            let value = format!("{} -> {}", formatter.style_name(container), formatter.style_url(domain));
            lines.push(formatter.field("domain", &value, WIDTH));
        }
        lines.join("\n")
    }
}

/// JSON output for config updates
#[derive(Serialize)]
struct ConfigOperationOutput {
    success: bool,
    path: String,
    message: String,
}

/// Execute a config subcommand
pub async fn execute(cmd: ConfigCommands, overrides: Overrides, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match super::config_manager(&formatter) {
        Ok(m) => m,
        Err(code) => return code,
    };
    let mut config = match manager.load() {
        Ok(c) => c,
        Err(e) => return super::report(&formatter, "Failed to load config", &e),
    };

    match cmd {
        ConfigCommands::Set(args) => execute_set(args, &overrides, &manager, &mut config, &formatter),
        ConfigCommands::Domain(args) => execute_domain(args, &manager, &mut config, &formatter),
        ConfigCommands::Show => {
            let view = ConfigView::new(&manager, &config);
            if formatter.is_json() {
                formatter.json(&view);
            } else {
                formatter.println(&view.render(&formatter));
            }
            ExitCode::Success
        }
    }
}

/// Apply `set` arguments; returns whether anything changed
fn apply_set(args: SetArgs, overrides: &Overrides, config: &mut Config) -> bool {
    let before = config.clone();
    overrides.apply(config);

    if let Some(auth_url) = args.auth_url {
        config.client.auth_url = auth_url;
    }
    if let Some(threshold) = args.threshold {
        config.client.threshold_secs = threshold;
    }
    if let Some(max_retry) = args.max_retry {
        config.client.max_retry = Some(max_retry);
    }
    if let Some(delay) = args.retry_delay {
        config.client.retry_delay_secs = delay;
    }
    if let Some(timeout) = args.connect_timeout {
        config.client.connect_timeout_secs = timeout;
    }
    if let Some(gzip) = args.gzip {
        config.storage.use_gz = gzip;
    }
    if let Some(overwrite) = args.overwrite {
        config.storage.overwrite_files = overwrite;
    }

    *config != before
}

fn execute_set(
    args: SetArgs,
    overrides: &Overrides,
    manager: &ConfigManager,
    config: &mut Config,
    formatter: &Formatter,
) -> ExitCode {
    if !apply_set(args, overrides, config) {
        formatter.warning("Nothing to change");
    }

    if let Err(e) = config.client.validate() {
        return super::report(formatter, "Invalid configuration", &e);
    }

    save(manager, config, formatter, "Configuration saved")
}

fn execute_domain(
    args: DomainArgs,
    manager: &ConfigManager,
    config: &mut Config,
    formatter: &Formatter,
) -> ExitCode {
    if args.container.is_empty() || args.container.contains('/') {
        formatter.error("Container name must be non-empty and must not contain '/'");
        return ExitCode::UsageError;
    }
    let container = formatter.style_name(&args.container);

    match args.domain {
        Some(domain) if !args.remove => {
            config.storage.domains.insert(args.container.clone(), domain);
            save(
                manager,
                config,
                formatter,
                &format!("Domain for '{container}' configured"),
            )
        }
        _ => {
            if config.storage.domains.remove(&args.container).is_none() {
                formatter.error(&format!("No domain configured for '{}'", args.container));
                return ExitCode::NotFound;
            }
            save(
                manager,
                config,
                formatter,
                &format!("Domain for '{container}' removed"),
            )
        }
    }
}

fn save(manager: &ConfigManager, config: &Config, formatter: &Formatter, message: &str) -> ExitCode {
    if let Err(e) = manager.save(config) {
        return super::report(formatter, "Failed to save config", &e);
    }

    formatter.done(
        &ConfigOperationOutput {
            success: true,
            path: manager.path().display().to_string(),
            message: message.to_string(),
        },
        message,
    );
    ExitCode::Success
}
