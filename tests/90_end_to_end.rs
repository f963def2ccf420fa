mod common;

use anyhow::Result;
use serde_json::json;

use common::{scenario_store, TestServer};
use eduadmin_permissions::permissions::{AccountId, BulkSaveCoordinator, GrantId, MenuId, PermissionKind, PermissionSession};

#[tokio::test]
async fn account_42_walkthrough() -> Result<()> {
    let server = TestServer::spawn(scenario_store()).await?;
    let mut session = PermissionSession::open(server.coordinator()?, AccountId(42)).await?;

    // Initialization
    let users = session.matrix().menu(MenuId(1))?;
    assert_eq!(users.statuses(), [false, true, false, false]);
    assert_eq!(users.grant(PermissionKind::Read).persisted_id, Some(GrantId::from("g-9")));
    for kind in [PermissionKind::Create, PermissionKind::Update, PermissionKind::Delete] {
        assert!(users.grant(kind).persisted_id.is_none());
    }
    let courses = session.matrix().menu(MenuId(2))?;
    assert_eq!(courses.statuses(), [false; 4]);
    assert!(courses.grants().iter().all(|g| g.persisted_id.is_none()));

    // Toggle Create on Users
    session.toggle_kind(MenuId(1), PermissionKind::Create)?;
    let create = session.matrix().grant(MenuId(1), PermissionKind::Create)?;
    assert!(create.status);
    assert!(create.persisted_id.is_none());
    assert_eq!(session.matrix().menu(MenuId(1))?.statuses(), [true, true, false, false]);
    assert_eq!(session.matrix().menu(MenuId(2))?.statuses(), [false; 4]);

    // What goes over the wire
    let records = BulkSaveCoordinator::serialize(session.matrix());
    let flat: Vec<_> = records.iter().flat_map(|menu| &menu.permissions).collect();
    assert_eq!(flat.len(), 8);
    let wire = serde_json::to_value(&records)?;
    assert_eq!(wire[0]["permissions"][1]["id"], json!("g-9"));
    let sentinels = flat.iter().filter(|r| serde_json::to_value(r).map(|v| v["id"] == json!(0)).unwrap_or(false)).count();
    assert_eq!(sentinels, 7);

    // Save and refresh
    session.save().await?;
    let matrix = session.matrix();
    assert!(matrix.grants().all(|g| g.persisted_id.is_some()));
    assert_eq!(matrix.grant(MenuId(1), PermissionKind::Read)?.persisted_id, Some(GrantId::from("g-9")));
    assert!(matrix.status(MenuId(1), PermissionKind::Create)?);

    // The store now holds exactly one row per (menu, kind).
    assert_eq!(server.store.grant_count().await, 8);
    Ok(())
}
