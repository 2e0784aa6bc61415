//! download-file command
//!
//! Streams a remote file into the local filesystem chunk by chunk.

use clap::Args;
use dlk_core::{transfer, RemotePath};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::io::InspectWriter;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{cancel_on_ctrl_c, connect, fail, ConnectionArgs};

/// Download a remote file
#[derive(Args, Debug)]
pub struct DownloadFileArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// File path inside the filesystem
    #[arg(short = 'p', long)]
    pub path: String,

    /// Destination file; defaults to the remote file name in the current directory
    #[arg(long)]
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    status: &'static str,
    source: String,
    destination: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the download-file command
pub async fn execute(
    args: DownloadFileArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let source = RemotePath::new(&args.filesystem, &args.path);
    let destination = match &args.destination {
        Some(dest) => dest.clone(),
        None => match source.file_name() {
            Some(name) => PathBuf::from(name),
            None => {
                formatter.error("Remote path has no file name; pass --destination");
                return ExitCode::UsageError;
            }
        },
    };
    let dest_display = destination.display().to_string();

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                formatter.error(&format!("Failed to create directory: {e}"));
                return ExitCode::GeneralError;
            }
        }
    }

    let file = match tokio::fs::File::create(&destination).await {
        Ok(f) => f,
        Err(e) => {
            formatter.error(&format!("Failed to create {dest_display}: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let progress = ProgressBar::spinner(&output_config, "Downloading");
    let writer = InspectWriter::new(file, |chunk: &[u8]| progress.inc(chunk.len() as u64));
    let cancel = cancel_on_ctrl_c();

    let result = transfer::download(&client, &source, writer, &cancel).await;
    progress.finish_and_clear();

    match result {
        Ok(written) => {
            let size_human = humansize::format_size(written, humansize::BINARY);
            if formatter.is_json() {
                formatter.json(&DownloadOutput {
                    status: "success",
                    source: source.to_string(),
                    destination: dest_display,
                    size_bytes: written,
                    size_human,
                });
            } else {
                formatter.println(&format!("{source} -> {dest_display} ({size_human})"));
            }
            ExitCode::Success
        }
        Err(dlk_core::Error::NotFound(_)) => {
            formatter.error(&format!("File not found: {source}"));
            ExitCode::NotFound
        }
        Err(e) => fail(&formatter, &e),
    }
}
