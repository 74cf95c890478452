//! get command - Download an object
//!
//! Content goes to stdout unless `--output` names a file. Plain objects are
//! streamed chunk by chunk; gzip-stored objects are downloaded whole so they
//! can be decompressed.

use std::path::{Path, PathBuf};

use clap::Args;
use futures::StreamExt;
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use sc_core::{ObjectKey, Result, Storage};
use sc_swift::SwiftClient;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::Overrides;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Download an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object name (container/path)
    pub name: String,

    /// Write content to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct GetOutput {
    name: String,
    file: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the get command
pub async fn execute(args: GetArgs, overrides: Overrides, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let key = match super::parse_name(&args.name, &formatter) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let storage = match super::storage(&overrides, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let output = args.output.as_deref();
    let result = if storage.settings().use_gz {
        download_whole(&storage, &args.name, output).await
    } else {
        download_stream(storage.store(), &key, output, &formatter).await
    };

    let size = match result {
        Ok(size) => size,
        Err(e) => return super::report(&formatter, &format!("Failed to download {key}"), &e),
    };

    // Without --output stdout carries the content itself
    if let Some(path) = output {
        let size_human = format_size(size, BINARY);
        let message = format!(
            "Downloaded {} to {} ({})",
            formatter.style_name(&key.to_string()),
            path.display(),
            formatter.style_size(&size_human)
        );
        formatter.done(
            &GetOutput {
                name: key.to_string(),
                file: path.display().to_string(),
                size_bytes: size,
                size_human,
            },
            &message,
        );
    }
    ExitCode::Success
}

async fn open_output(path: Option<&Path>) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
    Ok(match path {
        Some(path) => Box::new(tokio::fs::File::create(path).await?),
        None => Box::new(tokio::io::stdout()),
    })
}

async fn download_whole(
    storage: &Storage<SwiftClient>,
    name: &str,
    path: Option<&Path>,
) -> Result<u64> {
    let content = storage.read(name).await?;
    let mut writer = open_output(path).await?;
    writer.write_all(&content).await?;
    writer.flush().await?;
    Ok(content.len() as u64)
}

async fn download_stream(
    client: &SwiftClient,
    key: &ObjectKey,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<u64> {
    let mut stream = client.get_stream(key).await?;

    // The bar draws on stderr, but only makes sense next to a file download
    let progress = match (path, stream.content_length()) {
        (Some(_), Some(total)) if formatter.progress_enabled() => Some(progress_bar(total, formatter)),
        _ => None,
    };

    let mut writer = open_output(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
        if let Some(pb) = &progress {
            pb.inc(chunk.len() as u64);
        }
    }
    writer.flush().await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    tracing::debug!(key = %key, bytes = written, "Download finished");
    Ok(written)
}

fn progress_bar(total: u64, formatter: &Formatter) -> ProgressBar {
    let template = if formatter.colors_enabled() {
        "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})"
    } else {
        "{spinner} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})"
    };

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
