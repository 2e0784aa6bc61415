//! Property query commands
//!
//! One properties request returns everything in headers; these commands
//! differ only in which derived view they print. User property values are
//! base64-encoded by the service and decoded on request.

use clap::Args;
use dlk_core::{properties, PathStore as _, RemotePath, SystemProperties, UserProperties};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, ConnectionArgs};

/// Show user and system properties of a path
#[derive(Args, Debug)]
pub struct GetPropertiesArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// Base64-decode user property values
    #[arg(long)]
    pub decode_user_properties: bool,

    /// Return identities as user principal names
    #[arg(long)]
    pub upn: bool,
}

/// Show user-defined properties of a path
#[derive(Args, Debug)]
pub struct GetUserPropertiesArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// Base64-decode user property values
    #[arg(long)]
    pub decode_user_properties: bool,
}

/// Show system properties of a path
#[derive(Args, Debug)]
pub struct GetSystemPropertiesArgs {
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

#[derive(Debug, Serialize)]
struct CombinedPropertiesOutput {
    user_properties: UserProperties,
    #[serde(flatten)]
    system: SystemProperties,
}

#[derive(Debug, Serialize)]
struct UserPropertiesOutput {
    path: String,
    user_properties: UserProperties,
}

fn print_system(formatter: &Formatter, system: &SystemProperties) {
    formatter.println(&format!("URL         : {}", system.url));
    let fields = [
        ("Modified", &system.last_modified),
        ("Type", &system.resource_type),
        ("Content-Type", &system.content_type),
        ("Cache-Control", &system.cache_control),
        ("Language", &system.content_language),
        ("Disposition", &system.content_disposition),
        ("Owner", &system.owner),
        ("Group", &system.group),
        ("Permissions", &system.permissions),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            formatter.println(&format!("{label:<12}: {value}"));
        }
    }
}

fn print_user(formatter: &Formatter, user: &UserProperties) {
    if user.is_empty() {
        formatter.println("(no user properties)");
        return;
    }
    for (key, value) in user {
        formatter.println(&format!("{key} = {value}"));
    }
}

/// Execute the get-properties command
pub async fn execute_combined(
    args: GetPropertiesArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let path = RemotePath::new(&args.filesystem, &args.path);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let headers = match client.get_properties(&path, args.upn).await {
        Ok(h) => h,
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!("Path not found: {path}"));
            return ExitCode::NotFound;
        }
        Err(e) => return fail(&formatter, &e),
    };

    let user = match properties::user_properties(&headers, args.decode_user_properties) {
        Ok(u) => u,
        Err(e) => return fail(&formatter, &e),
    };
    let system = SystemProperties::from_headers(&headers, client.url_for(&path));

    if formatter.is_json() {
        formatter.json(&CombinedPropertiesOutput {
            user_properties: user,
            system,
        });
    } else {
        print_system(&formatter, &system);
        print_user(&formatter, &user);
    }
    ExitCode::Success
}

/// Execute the get-user-properties command
pub async fn execute_user(
    args: GetUserPropertiesArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let path = RemotePath::new(&args.filesystem, &args.path);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let headers = match client.get_properties(&path, false).await {
        Ok(h) => h,
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!("Path not found: {path}"));
            return ExitCode::NotFound;
        }
        Err(e) => return fail(&formatter, &e),
    };

    match properties::user_properties(&headers, args.decode_user_properties) {
        Ok(user) => {
            if formatter.is_json() {
                formatter.json(&UserPropertiesOutput {
                    path: path.to_string(),
                    user_properties: user,
                });
            } else {
                print_user(&formatter, &user);
            }
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Execute the get-system-properties command
pub async fn execute_system(
    args: GetSystemPropertiesArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let path = RemotePath::new(&args.filesystem, &args.path);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    match client.get_properties(&path, args.upn).await {
        Ok(headers) => {
            let system = SystemProperties::from_headers(&headers, client.url_for(&path));
            if formatter.is_json() {
                formatter.json(&system);
            } else {
                print_system(&formatter, &system);
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
