//! delete-filesystem command
//!
//! Deletes a filesystem and everything in it.

use clap::Args;
use dlk_core::PathStore as _;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, ConnectionArgs};

/// Delete a filesystem
#[derive(Args, Debug)]
pub struct DeleteFilesystemArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,
}

#[derive(Debug, Serialize)]
struct DeleteFilesystemOutput {
    status: &'static str,
    filesystem: String,
}

/// Execute the delete-filesystem command
pub async fn execute(
    args: DeleteFilesystemArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    match client.delete_filesystem(&args.filesystem).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&DeleteFilesystemOutput {
                    status: "success",
                    filesystem: args.filesystem,
                });
            } else {
                formatter.success(&format!("Filesystem '{}' deleted.", args.filesystem));
            }
            ExitCode::Success
        }
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!("Filesystem '{}' does not exist", args.filesystem));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, &e),
    }
}
