//! Output formatter shared by all commands
//!
//! Human mode prints styled text. JSON mode prints exactly one JSON document
//! on stdout per successful command and a JSON error object on stderr.

use console::Style;
use serde::Serialize;

use super::OutputConfig;

/// Styles applied in human mode
#[derive(Debug, Clone)]
pub struct Theme {
    pub size: Style,
    pub key: Style,
    pub url: Style,
    pub name: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
}

impl Theme {
    /// Colored theme, or one that leaves text untouched
    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            size: pick(Style::new().green()),
            key: pick(Style::new().cyan()),
            url: pick(Style::new().cyan().underlined()),
            name: pick(Style::new().bold()),
            success: pick(Style::new().green()),
            error: pick(Style::new().red()),
            warning: pick(Style::new().yellow()),
        }
    }
}

/// Formatter for CLI output
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        let theme = Theme::new(!config.no_color && !config.json);
        Self { config, theme }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Progress bars are only drawn for interactive human output
    pub fn progress_enabled(&self) -> bool {
        !self.config.quiet && !self.config.json
    }

    pub fn style_size(&self, text: &str) -> String {
        self.theme.size.apply_to(text).to_string()
    }

    pub fn style_url(&self, text: &str) -> String {
        self.theme.url.apply_to(text).to_string()
    }

    pub fn style_name(&self, text: &str) -> String {
        self.theme.name.apply_to(text).to_string()
    }

    /// `key: value` line with the key padded to `width` columns
    pub fn field(&self, key: &str, value: &str, width: usize) -> String {
        let key = format!("{:<width$}", format!("{key}:"));
        format!("{} {value}", self.theme.key.apply_to(key))
    }

    /// Report a finished command
    ///
    /// JSON mode prints `value`; human mode prints `message` as a success line.
    pub fn done<T: Serialize>(&self, value: &T, message: &str) {
        if self.config.json {
            self.json(value);
        } else {
            self.success(message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{} {message}", self.theme.success.apply_to("✓"));
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{} {message}", self.theme.error.apply_to("✗"));
        }
    }

    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{} {message}", self.theme.warning.apply_to("⚠"));
    }

    /// Print a JSON document, ignoring quiet mode
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
