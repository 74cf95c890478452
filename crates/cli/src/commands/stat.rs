//! stat command - Show object metadata

use clap::Args;
use humansize::{BINARY, format_size};
use serde::Serialize;

use super::Overrides;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show size and URL of an object
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Object name (container/path)
    pub name: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    name: String,
    size_bytes: u64,
    size_human: String,
    url: String,
}

impl StatOutput {
    fn render(&self, formatter: &Formatter) -> String {
        const WIDTH: usize = 5;
        let size = format!("{} ({} bytes)", self.size_human, self.size_bytes);
        [
            formatter.field("Name", &formatter.style_name(&self.name), WIDTH),
            formatter.field("Size", &formatter.style_size(&size), WIDTH),
            formatter.field("URL", &formatter.style_url(&self.url), WIDTH),
        ]
        .join("\n")
    }
}

/// Execute the stat command
///
/// A missing object exits with the not-found code.
pub async fn execute(args: StatArgs, overrides: Overrides, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let key = match super::parse_name(&args.name, &formatter) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let storage = match super::storage(&overrides, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match storage.exists(&args.name).await {
        Ok(true) => {}
        Ok(false) => {
            formatter.error(&format!("Object not found: {key}"));
            return ExitCode::NotFound;
        }
        Err(e) => return super::report(&formatter, &format!("Failed to stat {key}"), &e),
    }

    let size = match storage.size(&args.name).await {
        Ok(s) => s,
        Err(e) => return super::report(&formatter, &format!("Failed to stat {key}"), &e),
    };
    let url = match storage.url(&args.name).await {
        Ok(u) => u,
        Err(e) => return super::report(&formatter, &format!("Failed to build URL for {key}"), &e),
    };

    let output = StatOutput {
        name: key.to_string(),
        size_bytes: size,
        size_human: format_size(size, BINARY),
        url,
    };
    if formatter.is_json() {
        formatter.json(&output);
    } else {
        formatter.println(&output.render(&formatter));
    }
    ExitCode::Success
}
