pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::config;
use crate::permissions::{BulkSaveCoordinator, InitializerSettings};
use crate::store::http::HttpAdminApi;

#[derive(Parser)]
#[command(name = "eduadmin")]
#[command(about = "Education admin console - account permission management")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Admin API base URL (overrides EDUADMIN_API_URL)")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Menu catalog")]
    Menus {
        #[command(subcommand)]
        cmd: commands::menus::MenuCommands,
    },

    #[command(about = "Per-account menu permissions")]
    Permissions {
        #[command(subcommand)]
        cmd: commands::permissions::PermissionCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Store client and save coordinator shared by every command
pub struct CliContext {
    pub api: Arc<HttpAdminApi>,
    pub coordinator: Arc<BulkSaveCoordinator>,
}

impl CliContext {
    pub fn connect(server: Option<&str>) -> anyhow::Result<Self> {
        let app_config = config();
        let mut api_config = app_config.api.clone();
        if let Some(url) = server {
            api_config.base_url = url.to_string();
        }

        let api = Arc::new(HttpAdminApi::from_config(&api_config)?);
        let coordinator = Arc::new(BulkSaveCoordinator::new(
            api.clone(),
            api.clone(),
            InitializerSettings::from_config(&app_config.permissions),
        ));

        Ok(Self { api, coordinator })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let context = CliContext::connect(cli.server.as_deref())?;

    match cli.command {
        Commands::Menus { cmd } => commands::menus::handle(cmd, &context, output_format).await,
        Commands::Permissions { cmd } => commands::permissions::handle(cmd, &context, output_format).await,
    }
}
