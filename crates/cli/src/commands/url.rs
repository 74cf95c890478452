//! url command - Print the public URL of an object

use clap::Args;
use serde::Serialize;

use super::Overrides;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Print the public URL of an object
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// Object name (container/path)
    pub name: String,
}

#[derive(Debug, Serialize)]
struct UrlOutput {
    name: String,
    url: String,
}

/// Execute the url command
///
/// A configured custom domain answers without contacting the server.
pub async fn execute(args: UrlArgs, overrides: Overrides, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let key = match super::parse_name(&args.name, &formatter) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let storage = match super::storage(&overrides, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match storage.url(&args.name).await {
        Ok(url) => {
            if formatter.is_json() {
                formatter.json(&UrlOutput {
                    name: key.to_string(),
                    url,
                });
            } else {
                formatter.println(&formatter.style_url(&url));
            }
            ExitCode::Success
        }
        Err(e) => super::report(&formatter, &format!("Failed to build URL for {key}"), &e),
    }
}
