//! create-filesystem command
//!
//! Creates a new filesystem in the storage account.

use clap::Args;
use dlk_core::{path::validate_filesystem_name, PathStore as _};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, ConnectionArgs};

/// Create a filesystem
#[derive(Args, Debug)]
pub struct CreateFilesystemArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,
}

#[derive(Debug, Serialize)]
struct CreateFilesystemOutput {
    status: &'static str,
    filesystem: String,
}

/// Execute the create-filesystem command
pub async fn execute(
    args: CreateFilesystemArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if let Err(e) = validate_filesystem_name(&args.filesystem) {
        return fail(&formatter, &e);
    }

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    match client.create_filesystem(&args.filesystem).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&CreateFilesystemOutput {
                    status: "success",
                    filesystem: args.filesystem,
                });
            } else {
                formatter.success(&format!("Filesystem '{}' created.", args.filesystem));
            }
            ExitCode::Success
        }
        Err(dlk_core::Error::Conflict(_)) => {
            formatter.error(&format!("Filesystem '{}' already exists", args.filesystem));
            ExitCode::Conflict
        }
        Err(e) => fail(&formatter, &e),
    }
}
