//! Wire format shared by the HTTP client and the development server

use serde::{Deserialize, Deserializer, Serialize};

use crate::permissions::model::{AccountId, GrantId, MenuId, PermissionGrant, PermissionKind};

/// Id sent for a grant the store has never seen
pub const UNSAVED_GRANT_ID: i64 = 0;

/// One grant as the store exchanges it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    #[serde(default, with = "grant_id")]
    pub id: Option<GrantId>,
    pub account_id: AccountId,
    pub menu_id: MenuId,
    pub permission_code: i64,
    #[serde(deserialize_with = "bool_or_int")]
    pub status: bool,
}

impl GrantRecord {
    pub fn from_grant(grant: &PermissionGrant) -> Self {
        Self {
            id: grant.persisted_id.clone(),
            account_id: grant.account_id,
            menu_id: grant.menu_id,
            permission_code: i64::from(grant.kind.code()),
            status: grant.status,
        }
    }

    pub fn kind(&self) -> Option<PermissionKind> {
        PermissionKind::from_code(self.permission_code)
    }

    /// None when the record carries a code outside the four known kinds
    pub fn into_grant(self) -> Option<PermissionGrant> {
        let kind = self.kind()?;
        Some(PermissionGrant {
            account_id: self.account_id,
            menu_id: self.menu_id,
            kind,
            status: self.status,
            persisted_id: self.id,
        })
    }
}

/// The four records of one menu, in `PermissionKind::ALL` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuGrantRecords {
    pub menu_id: MenuId,
    pub permissions: Vec<GrantRecord>,
}

/// Body of `POST /api/accounts/:account_id/permissions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpsertRequest {
    pub menus: Vec<MenuGrantRecords>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkUpsertSummary {
    pub saved: usize,
}

/// `{"success": bool, "data": ..., "error": ...}` response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Grant ids travel as numbers or strings; `0`, `"0"`, `""` and `null` mean unsaved.
pub mod grant_id {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::UNSAVED_GRANT_ID;
    use crate::permissions::model::GrantId;

    pub fn serialize<S>(id: &Option<GrantId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            None => serializer.serialize_i64(UNSAVED_GRANT_ID),
            Some(GrantId::Numeric(id)) => serializer.serialize_i64(*id),
            Some(GrantId::Text(id)) => serializer.serialize_str(id),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<GrantId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<GrantId>::deserialize(deserializer)? {
            Some(GrantId::Numeric(UNSAVED_GRANT_ID)) => None,
            Some(GrantId::Text(id)) if id.is_empty() || id == "0" => None,
            id => id,
        })
    }
}

fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawStatus {
        Flag(bool),
        Numeric(i64),
    }

    Ok(match RawStatus::deserialize(deserializer)? {
        RawStatus::Flag(flag) => flag,
        RawStatus::Numeric(n) => n != 0,
    })
}
