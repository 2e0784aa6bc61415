//! update-owner and update-group-owner commands
//!
//! Both are thin setAccessControl calls that change a single ownership field
//! and leave everything else untouched.

use clap::Args;
use dlk_core::{AccessControlUpdate, PathStore as _, RemotePath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, ConnectionArgs};

/// Set the owning user of a path
#[derive(Args, Debug)]
pub struct UpdateOwnerArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// New owner to set
    #[arg(short = 'o', long)]
    pub owner: String,
}

/// Set the owning group of a path
#[derive(Args, Debug)]
pub struct UpdateGroupOwnerArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// New group owner to set
    #[arg(short = 'o', long)]
    pub owner: String,
}

#[derive(Debug, Serialize)]
struct OwnerOutput {
    status: &'static str,
    path: String,
    field: &'static str,
    value: String,
}

/// Execute the update-owner command
pub async fn execute_owner(
    args: UpdateOwnerArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let path = RemotePath::new(&args.filesystem, &args.path);
    let update = AccessControlUpdate {
        owner: Some(args.owner.clone()),
        ..Default::default()
    };
    apply(path, update, "owner", args.owner, conn, output_config).await
}

/// Execute the update-group-owner command
pub async fn execute_group_owner(
    args: UpdateGroupOwnerArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let path = RemotePath::new(&args.filesystem, &args.path);
    let update = AccessControlUpdate {
        group: Some(args.owner.clone()),
        ..Default::default()
    };
    apply(path, update, "group", args.owner, conn, output_config).await
}

async fn apply(
    path: RemotePath,
    update: AccessControlUpdate,
    field: &'static str,
    value: String,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    match client.set_access_control(&path, update).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&OwnerOutput {
                    status: "success",
                    path: path.to_string(),
                    field,
                    value,
                });
            } else {
                formatter.success(&format!("Set {field} of '{path}' to '{value}'."));
            }
            ExitCode::Success
        }
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!("Path not found: {path}"));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, &e),
    }
}
