//! list-filesystems command
//!
//! Lists filesystems in the account through the paginated listing session.
//! With --include-acl, the root directory ACL of each listed filesystem is
//! fetched afterwards through the path access-control endpoint.

use clap::Args;
use dlk_core::{
    drain_pages, properties, Error, FilesystemItem, ListFilesystemsOptions, Listing,
    PagingOptions, PathStore as _, RemotePath, Result,
};
use dlk_rest::DfsClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{cancel_on_ctrl_c, connect, fail, ConnectionArgs};

/// List filesystems in the account
#[derive(Args, Debug)]
pub struct ListFilesystemsArgs {
    /// Only filesystems whose names start with this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Also fetch each filesystem's root directory ACL
    #[arg(long)]
    pub include_acl: bool,

    /// Stop requesting pages once this many results have accumulated
    #[arg(long)]
    pub max_results: Option<u32>,

    /// Keep following continuation tokens until exhaustion
    #[arg(long)]
    pub iterate_in_results: bool,

    /// Continuation token from a previous listing to resume from
    #[arg(long)]
    pub continuation: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListFilesystemsOutput {
    filesystems: Vec<FilesystemItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation: Option<String>,
}

/// Execute the list-filesystems command
pub async fn execute(
    args: ListFilesystemsArgs,
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
        Err(e) => fail(&formatter, &e),
    }
}

async fn run(
    client: &DfsClient,
    args: &ListFilesystemsArgs,
    cancel: &CancellationToken,
) -> Result<Listing<FilesystemItem>> {
    let mut listing = drain_pages(
        |continuation| {
            client.list_filesystems(ListFilesystemsOptions {
                prefix: args.prefix.clone(),
                max_results: args.max_results,
                continuation,
            })
        },
        PagingOptions {
            iterate_in_results: args.iterate_in_results,
            max_results: args.max_results,
            resume_from: args.continuation.clone(),
        },
        cancel,
    )
    .await?;

    if args.include_acl {
        for item in &mut listing.items {
            if cancel.is_cancelled() {
                return Err(Error::Interrupted);
            }
            let root = RemotePath::root(&item.name);
            let headers = client.get_access_control(&root, false).await?;
            item.acl = Some(properties::acl_from_headers(&headers)?);
        }
    }

    Ok(listing)
}

fn present(formatter: &Formatter, listing: Listing<FilesystemItem>) {
    if formatter.is_json() {
        formatter.json(&ListFilesystemsOutput {
            filesystems: listing.items,
            continuation: listing.continuation,
        });
        return;
    }

    for item in &listing.items {
        let date = item.last_modified.as_deref().unwrap_or("");
        let mut line = format!("{:<31} {}", format!("[{date}]"), item.name);
        if let Some(acl) = &item.acl {
            line.push_str(&format!("  acl: {acl}"));
        }
        formatter.println(&line);
    }
    if let Some(token) = &listing.continuation {
        formatter.println(&format!(
            "\nMore results available; resume with --continuation {token}"
        ));
    }
}
