//! upload-file command
//!
//! Streams a local file to a filesystem directory with the chunked
//! create/append/flush session. The remote name is the source file's name
//! under the target directory.

use clap::Args;
use dlk_core::{transfer, RemotePath};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::io::InspectReader;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{cancel_on_ctrl_c, connect, fail, ConnectionArgs};

/// Upload a local file in chunks
#[derive(Args, Debug)]
pub struct UploadFileArgs {
    /// Filesystem name
    #[arg(short = 'f', long)]
    pub filesystem: String,

    /// Source file path in the local filesystem
    #[arg(long)]
    pub source_file: PathBuf,

    /// Target directory in the filesystem
    #[arg(long)]
    pub target_directory: String,

    /// Chunk size in bytes
    #[arg(long, default_value_t = transfer::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the upload-file command
pub async fn execute(
    args: UploadFileArgs,
    conn: &ConnectionArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let file_name = match args.source_file.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            formatter.error(&format!(
                "Source path '{}' has no file name",
                args.source_file.display()
            ));
            return ExitCode::UsageError;
        }
    };
    let target = RemotePath::new(&args.filesystem, &args.target_directory).join(&file_name);
    let source_display = args.source_file.display().to_string();

    let file = match tokio::fs::File::open(&args.source_file).await {
        Ok(f) => f,
        Err(e) => {
            formatter.error(&format!("Failed to open {source_display}: {e}"));
            return ExitCode::GeneralError;
        }
    };
    let total = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(e) => {
            formatter.error(&format!("Failed to read metadata of {source_display}: {e}"));
            return ExitCode::GeneralError;
        }
    };

    let client = match connect(conn).await {
        Ok(c) => c,
        Err(e) => return fail(&formatter, &e),
    };

    let progress = ProgressBar::new(&output_config, total);
    let reader = InspectReader::new(file, |chunk: &[u8]| progress.inc(chunk.len() as u64));
    let cancel = cancel_on_ctrl_c();

    let result = transfer::upload(&client, &target, reader, args.chunk_size, &cancel).await;
    progress.finish_and_clear();

    match result {
        Ok(written) => {
            let size_human = humansize::format_size(written, humansize::BINARY);
            if formatter.is_json() {
                formatter.json(&UploadOutput {
                    status: "success",
                    source: source_display,
                    target: target.to_string(),
                    size_bytes: written,
                    size_human,
                });
            } else {
                formatter.println(&format!("{source_display} -> {target} ({size_human})"));
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
        Err(dlk_core::Error::Conflict(_)) => {
            formatter.error(&format!(
                "Target '{target}' conflicts with an existing path"
            ));
            ExitCode::Conflict
        }
        Err(e) => fail(&formatter, &e),
    }
}
