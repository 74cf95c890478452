//! Command implementations
//!
//! Each command builds its own [`Formatter`] and returns an [`ExitCode`];
//! errors are reported to the user here and never bubble out of `main`.

pub mod completions;
pub mod config;
pub mod get;
pub mod put;
pub mod rm;
pub mod stat;
pub mod url;

use sc_core::{Config, ConfigManager, Error, ObjectKey, Storage};
use sc_swift::SwiftClient;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Credentials given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Overrides {
    /// Apply the overrides on top of a loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(user) = &self.user {
            config.client.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.client.password = password.clone();
        }
    }
}

/// Print an error and map it to its exit code
pub fn report(formatter: &Formatter, context: &str, err: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {err}"));
    ExitCode::from_error(err)
}

pub fn config_manager(formatter: &Formatter) -> Result<ConfigManager, ExitCode> {
    ConfigManager::new().map_err(|e| report(formatter, "Failed to locate config", &e))
}

/// Load the config file with the command-line credentials applied
pub fn load_config(overrides: &Overrides, formatter: &Formatter) -> Result<Config, ExitCode> {
    let manager = config_manager(formatter)?;
    let mut config = manager
        .load()
        .map_err(|e| report(formatter, "Failed to load config", &e))?;
    overrides.apply(&mut config);
    Ok(config)
}

/// Build the storage adapter for object commands
pub fn storage(
    overrides: &Overrides,
    formatter: &Formatter,
) -> Result<Storage<SwiftClient>, ExitCode> {
    let config = load_config(overrides, formatter)?;
    let client = SwiftClient::new(&config.client)
        .map_err(|e| report(formatter, "Failed to create client", &e))?;
    Ok(Storage::new(client, config.storage))
}

/// Parse an object name of the form `container/path`
pub fn parse_name(name: &str, formatter: &Formatter) -> Result<ObjectKey, ExitCode> {
    let key = Storage::<SwiftClient>::key(name)
        .map_err(|e| report(formatter, "Invalid object name", &e))?;
    if key.path.is_empty() {
        formatter.error(&format!(
            "Invalid object name '{name}': expected container/path"
        ));
        return Err(ExitCode::UsageError);
    }
    Ok(key)
}
