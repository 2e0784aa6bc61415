//! create-folder command
//!
//! Creates a directory path inside a filesystem. Parent directories are
//! created implicitly by the service.

use clap::Args;
use dlk_core::{PathStore as _, RemotePath, ResourceType};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, ConnectionArgs};

/// Create a directory
#[derive(Args, Debug)]
pub struct CreateFolderArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Directory path to create
    #[arg(short = 'p', long)]
    pub path: String,
}

#[derive(Debug, Serialize)]
struct CreateFolderOutput {
    status: &'static str,
    path: String,
}

/// Execute the create-folder command
pub async fn execute(
    args: CreateFolderArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let path = RemotePath::new(&args.filesystem, &args.path);
    if path.is_root() {
        formatter.error("Directory path cannot be empty");
        return ExitCode::UsageError;
    }

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    match client.create_path(&path, ResourceType::Directory).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&CreateFolderOutput {
                    status: "success",
                    path: path.to_string(),
                });
            } else {
                formatter.success(&format!("Directory '{path}' created."));
            }
            ExitCode::Success
        }
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!(
                "Filesystem '{}' does not exist",
                args.filesystem
            ));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, &e),
    }
}
