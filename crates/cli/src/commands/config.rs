//! Settings management commands
//!
//! Shows or updates the stored account and credential settings. The client
//! secret is never echoed back.

use clap::{Args, Subcommand};
use serde::Serialize;

use dlk_core::{ConfigManager, Settings};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::AuthType;

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the stored settings
    Show,

    /// Update stored settings
    Set(SetArgs),
}

/// Arguments for the `config set` command
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Storage account name
    #[arg(long)]
    pub account: Option<String>,

    /// DNS suffix of the DFS endpoint
    #[arg(long)]
    pub dns_suffix: Option<String>,

    /// Credential source
    #[arg(long, value_enum)]
    pub auth_type: Option<AuthType>,

    /// Service principal client id
    #[arg(long)]
    pub client_id: Option<String>,

    /// Service principal client secret
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Service principal tenant id
    #[arg(long)]
    pub tenant_id: Option<String>,
}

/// Settings view for output, without sensitive data
#[derive(Debug, Serialize)]
struct SettingsView {
    account: Option<String>,
    dns_suffix: String,
    auth_type: Option<String>,
    client_id: Option<String>,
    tenant_id: Option<String>,
    client_secret_stored: bool,
}

impl From<&Settings> for SettingsView {
    fn from(settings: &Settings) -> Self {
        Self {
            account: settings.storage.account.clone(),
            dns_suffix: settings.storage.dns_suffix.clone(),
            auth_type: settings.auth.auth_type.clone(),
            client_id: settings.auth.client_id.clone(),
            tenant_id: settings.auth.tenant_id.clone(),
            client_secret_stored: settings.auth.client_secret.is_some(),
        }
    }
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => return super::fail(&formatter, &e),
    };

    match cmd {
        ConfigCommands::Show => show(&manager, &formatter),
        ConfigCommands::Set(args) => set(args, &manager, &formatter),
    }
}

fn show(manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    match manager.load() {
        Ok(settings) => {
            let view = SettingsView::from(&settings);
            if formatter.is_json() {
                formatter.json(&view);
            } else {
                formatter.println(&format!(
                    "account      : {}",
                    view.account.as_deref().unwrap_or("(unset)")
                ));
                formatter.println(&format!("dns suffix   : {}", view.dns_suffix));
                formatter.println(&format!(
                    "auth type    : {}",
                    view.auth_type.as_deref().unwrap_or("identity")
                ));
                formatter.println(&format!(
                    "client id    : {}",
                    view.client_id.as_deref().unwrap_or("(unset)")
                ));
                formatter.println(&format!(
                    "tenant id    : {}",
                    view.tenant_id.as_deref().unwrap_or("(unset)")
                ));
                formatter.println(&format!(
                    "client secret: {}",
                    if view.client_secret_stored {
                        "(stored)"
                    } else {
                        "(unset)"
                    }
                ));
            }
            ExitCode::Success
        }
        Err(e) => super::fail(formatter, &e),
    }
}

fn set(args: SetArgs, manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let mut settings = match manager.load() {
        Ok(s) => s,
        Err(e) => return super::fail(formatter, &e),
    };

    if let Some(account) = args.account {
        settings.storage.account = Some(account);
    }
    if let Some(dns_suffix) = args.dns_suffix {
        settings.storage.dns_suffix = dns_suffix;
    }
    if let Some(auth_type) = args.auth_type {
        settings.auth.auth_type = Some(auth_type.as_str().to_string());
    }
    if let Some(client_id) = args.client_id {
        settings.auth.client_id = Some(client_id);
    }
    if let Some(client_secret) = args.client_secret {
        settings.auth.client_secret = Some(client_secret);
    }
    if let Some(tenant_id) = args.tenant_id {
        settings.auth.tenant_id = Some(tenant_id);
    }

    match manager.save(&settings) {
        Ok(()) => {
            formatter.success(&format!(
                "Settings saved to {}",
                manager.config_path().display()
            ));
            ExitCode::Success
        }
        Err(e) => super::fail(formatter, &e),
    }
}
