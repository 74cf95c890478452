//! rm command - Delete an object

use clap::Args;
use sc_core::ObjectStore as _;
use serde::Serialize;

use super::Overrides;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Delete an object
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object name (container/path)
    pub name: String,

    /// Succeed even if the object does not exist
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    success: bool,
    name: String,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, overrides: Overrides, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let key = match super::parse_name(&args.name, &formatter) {
        Ok(k) => k,
        Err(code) => return code,
    };
    let storage = match super::storage(&overrides, &formatter) {
        Ok(s) => s,
        Err(code) => return code,
    };

    if let Err(e) = storage.store().delete_object(&key, args.force).await {
        return super::report(&formatter, &format!("Failed to remove {key}"), &e);
    }

    let name = key.to_string();
    formatter.done(
        &RmOutput {
            success: true,
            name: name.clone(),
        },
        &format!("Removed {}", formatter.style_name(&name)),
    );
    ExitCode::Success
}
