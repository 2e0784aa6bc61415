//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations. Every
//! remote command resolves the connection the same way: explicit flags, then
//! environment variables, then the configuration file. The command layer is
//! the only place that turns typed errors into messages and exit codes;
//! library code always propagates.

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use dlk_core::{ConfigManager, CredentialSource, Error, Settings};
use dlk_rest::DfsClient;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod acl;
mod completions;
mod config;
mod create_filesystem;
mod create_folder;
mod delete_filesystem;
mod download;
mod list_filesystems;
mod list_paths;
mod owner;
mod properties;
mod upload;

/// dlk - Datalake CLI client
///
/// A command-line interface for hierarchical-namespace object storage
/// accounts exposed through a DFS endpoint.
#[derive(Parser, Debug)]
#[command(name = "dlk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// How to reach and authenticate against the storage account
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Storage account name
    #[arg(short = 'a', long, global = true, env = "ADL_TOOL_ACCOUNT_NAME")]
    pub account: Option<String>,

    /// DNS suffix of the DFS endpoint
    #[arg(long, global = true)]
    pub dns_suffix: Option<String>,

    /// Credential source
    #[arg(long, global = true, value_enum)]
    pub auth_type: Option<AuthType>,

    /// Service principal client id
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Service principal client secret
    #[arg(long, global = true)]
    pub client_secret: Option<String>,

    /// Service principal tenant id
    #[arg(long, global = true)]
    pub tenant_id: Option<String>,
}

/// Supported credential sources
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// Service principal from AZURE_* environment variables
    Environment,
    /// Managed identity of the host
    Identity,
    /// Explicit service principal
    ServicePrincipal,
}

impl AuthType {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthType::Environment => "environment",
            AuthType::Identity => "identity",
            AuthType::ServicePrincipal => "service-principal",
        }
    }

    fn from_settings(settings: &Settings) -> Self {
        match settings.auth.auth_type.as_deref() {
            Some("environment") => AuthType::Environment,
            Some("service-principal") => AuthType::ServicePrincipal,
            // "identity" is the default credential source
            _ => AuthType::Identity,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a filesystem
    CreateFilesystem(create_filesystem::CreateFilesystemArgs),

    /// Delete a filesystem
    DeleteFilesystem(delete_filesystem::DeleteFilesystemArgs),

    /// Create a directory inside a filesystem
    CreateFolder(create_folder::CreateFolderArgs),

    /// Set the owning user of a path
    UpdateOwner(owner::UpdateOwnerArgs),

    /// Set the owning group of a path
    UpdateGroupOwner(owner::UpdateGroupOwnerArgs),

    /// Show user and system properties of a path
    GetProperties(properties::GetPropertiesArgs),

    /// Show user-defined properties of a path
    GetUserProperties(properties::GetUserPropertiesArgs),

    /// Show system properties of a path
    GetSystemProperties(properties::GetSystemPropertiesArgs),

    /// Show the access control list of a path
    GetAcl(acl::GetAclArgs),

    /// Replace the access control list of a path
    UpdateAcl(acl::UpdateAclArgs),

    /// Upload a local file in chunks
    UploadFile(upload::UploadFileArgs),

    /// Download a remote file
    DownloadFile(download::DownloadFileArgs),

    /// List filesystems in the account
    ListFilesystems(list_filesystems::ListFilesystemsArgs),

    /// List paths inside a filesystem
    ListPathItems(list_paths::ListPathItemsArgs),

    /// Show or change stored settings
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let conn = &cli.connection;
    match cli.command {
        Commands::CreateFilesystem(args) => {
            create_filesystem::execute(args, conn, output_config).await
        }
        Commands::DeleteFilesystem(args) => {
            delete_filesystem::execute(args, conn, output_config).await
        }
        Commands::CreateFolder(args) => create_folder::execute(args, conn, output_config).await,
        Commands::UpdateOwner(args) => owner::execute_owner(args, conn, output_config).await,
        Commands::UpdateGroupOwner(args) => {
            owner::execute_group_owner(args, conn, output_config).await
        }
        Commands::GetProperties(args) => {
            properties::execute_combined(args, conn, output_config).await
        }
        Commands::GetUserProperties(args) => {
            properties::execute_user(args, conn, output_config).await
        }
        Commands::GetSystemProperties(args) => {
            properties::execute_system(args, conn, output_config).await
        }
        Commands::GetAcl(args) => acl::execute_get(args, conn, output_config).await,
        Commands::UpdateAcl(args) => acl::execute_update(args, conn, output_config).await,
        Commands::UploadFile(args) => upload::execute(args, conn, output_config).await,
        Commands::DownloadFile(args) => download::execute(args, conn, output_config).await,
        Commands::ListFilesystems(args) => {
            list_filesystems::execute(args, conn, output_config).await
        }
        Commands::ListPathItems(args) => list_paths::execute(args, conn, output_config).await,
        Commands::Config(cmd) => config::execute(cmd, output_config),
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Resolve settings and credentials into a connected client
///
/// Flags override environment variables, which override the configuration
/// file. The credential source is resolved exactly once; the resulting token
/// provider is owned by the client.
pub(crate) async fn connect(conn: &ConnectionArgs) -> dlk_core::Result<DfsClient> {
    let settings = ConfigManager::new()?.load()?;

    let account = conn
        .account
        .clone()
        .or_else(|| settings.resolved_account())
        .ok_or_else(|| {
            Error::Config(
                "No storage account given; pass --account or set ADL_TOOL_ACCOUNT_NAME".into(),
            )
        })?;
    let dns_suffix = conn
        .dns_suffix
        .clone()
        .unwrap_or_else(|| settings.storage.dns_suffix.clone());

    let auth_type = conn
        .auth_type
        .unwrap_or_else(|| AuthType::from_settings(&settings));
    let source = match auth_type {
        AuthType::Environment => CredentialSource::Environment,
        AuthType::Identity => CredentialSource::ManagedIdentity,
        AuthType::ServicePrincipal => CredentialSource::service_principal(
            &settings,
            conn.client_id.clone(),
            conn.client_secret.clone(),
            conn.tenant_id.clone(),
        )?,
    };

    let provider = dlk_rest::provider_for(&source)?;
    tracing::debug!(account = %account, auth_type = auth_type.as_str(), "connecting");
    DfsClient::new(account, dns_suffix, provider)
}

/// Print a typed error and map it to the process exit code
pub(crate) fn fail(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from_error(error)
}

/// Cancellation token that trips on Ctrl-C
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_upload_command() {
        let cli = Cli::parse_from([
            "dlk",
            "--account",
            "contoso",
            "upload-file",
            "-f",
            "data",
            "--source-file",
            "./report.csv",
            "--target-directory",
            "incoming",
        ]);
        assert_eq!(cli.connection.account.as_deref(), Some("contoso"));
        match cli.command {
            Commands::UploadFile(args) => {
                assert_eq!(args.filesystem, "data");
                assert_eq!(args.target_directory, "incoming");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_path_items_flags() {
        let cli = Cli::parse_from([
            "dlk",
            "list-path-items",
            "-f",
            "data",
            "-p",
            "logs",
            "--recursive",
            "--iterate-in-results",
            "--max-results",
            "50",
            "--upn",
        ]);
        match cli.command {
            Commands::ListPathItems(args) => {
                assert_eq!(args.filesystem, "data");
                assert_eq!(args.path.as_deref(), Some("logs"));
                assert!(args.recursive);
                assert!(args.iterate_in_results);
                assert_eq!(args.max_results, Some(50));
                assert!(args.upn);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dlk", "list-filesystems", "--json", "-a", "contoso"]);
        assert!(cli.json);
        assert_eq!(cli.connection.account.as_deref(), Some("contoso"));
    }

    #[test]
    fn test_auth_type_from_settings() {
        let mut settings = Settings::default();
        assert_eq!(AuthType::from_settings(&settings), AuthType::Identity);

        settings.auth.auth_type = Some("environment".into());
        assert_eq!(AuthType::from_settings(&settings), AuthType::Environment);

        settings.auth.auth_type = Some("service-principal".into());
        assert_eq!(
            AuthType::from_settings(&settings),
            AuthType::ServicePrincipal
        );
    }
}
