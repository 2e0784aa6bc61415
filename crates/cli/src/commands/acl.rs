//! get-acl and update-acl commands
//!
//! The ACL string is treated as an opaque value: read from the
//! getAccessControl response header, written via setAccessControl.

use clap::Args;
use dlk_core::{properties, AccessControlUpdate, PathStore as _, RemotePath};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, ConnectionArgs};

/// Show the access control list of a path
#[derive(Args, Debug)]
pub struct GetAclArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// Return identities as user principal names
    #[arg(long)]
    pub upn: bool,
}

/// Replace the access control list of a path
#[derive(Args, Debug)]
pub struct UpdateAclArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// New ACL to set
    #[arg(long)]
    pub acl: String,
}

#[derive(Debug, Serialize)]
struct AclOutput {
    path: String,
    acl: String,
}

#[derive(Debug, Serialize)]
struct UpdateAclOutput {
    status: &'static str,
    path: String,
    acl: String,
}

/// Execute the get-acl command
pub async fn execute_get(
    args: GetAclArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let path = RemotePath::new(&args.filesystem, &args.path);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let headers = match client.get_access_control(&path, args.upn).await {
        Ok(h) => h,
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!("Path not found: {path}"));
            return ExitCode::NotFound;
        }
        Err(e) => return fail(&formatter, &e),
    };

    match properties::acl_from_headers(&headers) {
        Ok(acl) => {
            if formatter.is_json() {
                formatter.json(&AclOutput {
                    path: path.to_string(),
                    acl,
                });
            } else {
                formatter.println(&acl);
            }
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Execute the update-acl command
pub async fn execute_update(
    args: UpdateAclArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let path = RemotePath::new(&args.filesystem, &args.path);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let update = AccessControlUpdate {
        acl: Some(args.acl.clone()),
        ..Default::default()
    };

    match client.set_access_control(&path, update).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&UpdateAclOutput {
                    status: "success",
                    path: path.to_string(),
                    acl: args.acl,
                });
            } else {
                formatter.success(&format!("Updated ACL of '{path}'."));
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
