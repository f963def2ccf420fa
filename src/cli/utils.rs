use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::permissions::{PermissionKind, PermissionMatrix};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Output a permission matrix in the appropriate format
pub fn print_matrix(output_format: &OutputFormat, matrix: &PermissionMatrix) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "matrix": matrix }))?);
        }
        OutputFormat::Text => {
            print!("{}", render_matrix(matrix));
        }
    }
    Ok(())
}

/// One row per menu, one column per kind, `x` for granted, `*` marks unsaved rows
pub fn render_matrix(matrix: &PermissionMatrix) -> String {
    let name_width = matrix
        .menus()
        .map(|entry| entry.menu.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!("Account {}\n", matrix.account_id());
    out.push_str(&format!("{:<8} {:<width$}  C R U D  ALL\n", "MENU", "NAME", width = name_width));

    for entry in matrix.menus() {
        let cells: Vec<&str> = PermissionKind::ALL
            .iter()
            .map(|kind| {
                let grant = entry.grant(*kind);
                match (grant.status, grant.is_persisted()) {
                    (true, _) => "x",
                    (false, true) => "-",
                    (false, false) => ".",
                }
            })
            .collect();
        let all = if entry.is_fully_selected() { "yes" } else { "" };
        out.push_str(&format!(
            "{:<8} {:<width$}  {}  {}\n",
            entry.menu.id.0,
            entry.menu.name,
            cells.join(" "),
            all,
            width = name_width
        ));
    }

    let all = if matrix.is_fully_selected() { "yes" } else { "no" };
    out.push_str(&format!("All menus fully granted: {}\n", all));
    out
}
