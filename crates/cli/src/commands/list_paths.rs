//! list-path-items command
//!
//! Lists paths under a filesystem or directory through the paginated listing
//! session, optionally recursively.

use clap::Args;
use dlk_core::{
    drain_pages, ListPathsOptions, Listing, PagingOptions, PathItem, PathStore as _, Result,
};
use dlk_rest::DfsClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{cancel_on_ctrl_c, connect, fail, ConnectionArgs};

/// List paths inside a filesystem
#[derive(Args, Debug)]
pub struct ListPathItemsArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Directory to list; omitted lists from the filesystem root
    #[arg(short = 'p', long)]
    pub path: Option<String>,

    /// Descend into subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Stop requesting pages once this many results have accumulated
    #[arg(long)]
    pub max_results: Option<u32>,

    /// Keep following continuation tokens until exhaustion
    #[arg(long)]
    pub iterate_in_results: bool,

    /// Return owner/group as user principal names
    #[arg(long)]
    pub upn: bool,

    /// Continuation token from a previous listing to resume from
    #[arg(long)]
    pub continuation: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListPathItemsOutput {
    items: Vec<PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation: Option<String>,
}

/// Execute the list-path-items command
pub async fn execute(
    args: ListPathItemsArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let cancel = cancel_on_ctrl_c();
    match run(&client, &args, &cancel).await {
        Ok(listing) => {
            present(&formatter, listing);
            ExitCode::Success
        }
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!(
                "Filesystem or directory not found: {}/{}",
                args.filesystem,
                args.path.as_deref().unwrap_or("")
            ));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, &e),
    }
}

async fn run(
    client: &DfsClient,
    args: &ListPathItemsArgs,
    cancel: &CancellationToken,
) -> Result<Listing<PathItem>> {
    drain_pages(
        |continuation| {
            client.list_paths(
                &args.filesystem,
                ListPathsOptions {
                    directory: args.path.clone(),
                    recursive: args.recursive,
                    max_results: args.max_results,
                    continuation,
                    upn: args.upn,
                },
            )
        },
        PagingOptions {
            iterate_in_results: args.iterate_in_results,
            max_results: args.max_results,
            resume_from: args.continuation.clone(),
        },
        cancel,
    )
    .await
}

fn present(formatter: &Formatter, listing: Listing<PathItem>) {
    if formatter.is_json() {
        formatter.json(&ListPathItemsOutput {
            items: listing.items,
            continuation: listing.continuation,
        });
        return;
    }

    for item in &listing.items {
        let date = item.last_modified.as_deref().unwrap_or("");
        if item.is_directory {
            formatter.println(&format!("{:<31} {:>10} {}/", format!("[{date}]"), "", item.name));
        } else {
            formatter.println(&format!(
                "{:<31} {:>10} {}",
                format!("[{date}]"),
                item.size_human(),
                item.name
            ));
        }
    }
    if let Some(token) = &listing.continuation {
        formatter.println(&format!(
            "\nMore results available; resume with --continuation {token}"
        ));
    }
}
