use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_empty_collection;
use crate::cli::{CliContext, OutputFormat};
use crate::store::MenuCatalog;

#[derive(Subcommand)]
pub enum MenuCommands {
    #[command(about = "List every manageable menu")]
    List,
}

pub async fn handle(cmd: MenuCommands, context: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        MenuCommands::List => {
            let menus = context.api.list_menus().await?;
            if menus.is_empty() {
                return output_empty_collection(&output_format, "menus", "No menus defined");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "menus": menus }))?);
                }
                OutputFormat::Text => {
                    println!("{:<8} {}", "ID", "NAME");
                    for menu in &menus {
                        println!("{:<8} {}", menu.id.0, menu.name);
                    }
                }
            }
            Ok(())
        }
    }
}
