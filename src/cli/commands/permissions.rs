use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, print_matrix};
use crate::cli::{CliContext, OutputFormat};
use crate::permissions::{AccountId, BulkSaveCoordinator, MenuId, PermissionKind, PermissionSession};

#[derive(Subcommand)]
pub enum PermissionCommands {
    #[command(about = "Show the permission matrix of an account")]
    Show {
        #[arg(help = "Account ID")]
        account: i64,
    },

    #[command(about = "Grant one action on one menu")]
    Grant {
        #[arg(help = "Account ID")]
        account: i64,
        #[arg(help = "Menu ID")]
        menu: i64,
        #[arg(help = "create, read, update or delete")]
        kind: PermissionKind,
        #[arg(long, help = "Print the records that would be saved instead of saving")]
        dry_run: bool,
    },

    #[command(about = "Revoke one action on one menu")]
    Revoke {
        #[arg(help = "Account ID")]
        account: i64,
        #[arg(help = "Menu ID")]
        menu: i64,
        #[arg(help = "create, read, update or delete")]
        kind: PermissionKind,
        #[arg(long, help = "Print the records that would be saved instead of saving")]
        dry_run: bool,
    },

    #[command(about = "Flip one action on one menu")]
    Toggle {
        #[arg(help = "Account ID")]
        account: i64,
        #[arg(help = "Menu ID")]
        menu: i64,
        #[arg(help = "create, read, update or delete")]
        kind: PermissionKind,
        #[arg(long, help = "Print the records that would be saved instead of saving")]
        dry_run: bool,
    },

    #[command(about = "Select or clear every action on one menu")]
    ToggleMenu {
        #[arg(help = "Account ID")]
        account: i64,
        #[arg(help = "Menu ID")]
        menu: i64,
        #[arg(long, help = "Print the records that would be saved instead of saving")]
        dry_run: bool,
    },

    #[command(about = "Select or clear every action on every menu")]
    ToggleAll {
        #[arg(help = "Account ID")]
        account: i64,
        #[arg(long, help = "Print the records that would be saved instead of saving")]
        dry_run: bool,
    },
}

pub async fn handle(cmd: PermissionCommands, context: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PermissionCommands::Show { account } => {
            let session = PermissionSession::open(context.coordinator.clone(), AccountId(account)).await?;
            print_matrix(&output_format, session.matrix())
        }
        PermissionCommands::Grant { account, menu, kind, dry_run } => {
            let mut session = PermissionSession::open(context.coordinator.clone(), AccountId(account)).await?;
            session.set_kind(MenuId(menu), kind, true)?;
            finish(session, dry_run, &output_format).await
        }
        PermissionCommands::Revoke { account, menu, kind, dry_run } => {
            let mut session = PermissionSession::open(context.coordinator.clone(), AccountId(account)).await?;
            session.set_kind(MenuId(menu), kind, false)?;
            finish(session, dry_run, &output_format).await
        }
        PermissionCommands::Toggle { account, menu, kind, dry_run } => {
            let mut session = PermissionSession::open(context.coordinator.clone(), AccountId(account)).await?;
            session.toggle_kind(MenuId(menu), kind)?;
            finish(session, dry_run, &output_format).await
        }
        PermissionCommands::ToggleMenu { account, menu, dry_run } => {
            let mut session = PermissionSession::open(context.coordinator.clone(), AccountId(account)).await?;
            session.toggle_all_kinds_for_menu(MenuId(menu))?;
            finish(session, dry_run, &output_format).await
        }
        PermissionCommands::ToggleAll { account, dry_run } => {
            let mut session = PermissionSession::open(context.coordinator.clone(), AccountId(account)).await?;
            session.toggle_all_menus();
            finish(session, dry_run, &output_format).await
        }
    }
}

/// Save the edited session (or show what would be saved) and print the result
async fn finish(mut session: PermissionSession, dry_run: bool, output_format: &OutputFormat) -> anyhow::Result<()> {
    if dry_run {
        let records = BulkSaveCoordinator::serialize(session.matrix());
        println!("{}", serde_json::to_string_pretty(&json!({ "menus": records }))?);
        return Ok(());
    }

    let account_id = session.account_id();
    if !session.is_dirty() {
        return output_success(
            output_format,
            &format!("Permissions for account {} already up to date", account_id),
            None,
        );
    }

    session.save().await?;
    let message = format!("Saved permissions for account {}", account_id);
    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            &message,
            Some(json!({ "account_id": account_id, "matrix": session.matrix() })),
        ),
        OutputFormat::Text => {
            output_success(output_format, &message, None)?;
            print_matrix(output_format, session.matrix())
        }
    }
}
