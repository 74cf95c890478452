//! Output handling for human-readable and JSON modes

mod formatter;

pub use formatter::Formatter;

/// Output settings taken from the global flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit strict JSON instead of styled text
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress everything except errors
    pub quiet: bool,
}
