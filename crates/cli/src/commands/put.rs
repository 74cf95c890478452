//! put command - Upload a local file
//!
//! Unless overwriting is enabled in the config, an existing object keeps its
//! content and the upload is stored under a numbered name instead.

use std::path::PathBuf;

use clap::Args;
use humansize::{BINARY, format_size};
use serde::Serialize;

use super::Overrides;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local file as an object
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Object name (container/path)
    pub name: String,

    /// Local file to upload
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    name: String,
    file: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, overrides: Overrides, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if let Err(code) = super::parse_name(&args.name, &formatter) {
        return code;
    }

    let content = match tokio::fs::read(&args.file).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to read {}: {e}", args.file.display()));
            return if e.kind() == std::io::ErrorKind::NotFound {
                ExitCode::NotFound
            } else {
                ExitCode::GeneralError
            };
        }
    };

    let storage = match super::storage(&overrides, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let stored = match storage.save(&args.name, &content).await {
        Ok(name) => name,
        Err(e) => return super::report(&formatter, &format!("Failed to upload {}", args.name), &e),
    };

    let size = content.len() as u64;
    let size_human = format_size(size, BINARY);
    if stored != args.name.trim_start_matches('/') {
        formatter.warning(&format!("'{}' exists, stored under a new name", args.name));
    }
    let message = format!(
        "Uploaded {} as {} ({})",
        args.file.display(),
        formatter.style_name(&stored),
        formatter.style_size(&size_human)
    );
    formatter.done(
        &PutOutput {
            name: stored,
            file: args.file.display().to_string(),
            size_bytes: size,
            size_human,
        },
        &message,
    );
    ExitCode::Success
}
