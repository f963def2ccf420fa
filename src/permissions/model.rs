use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::permissions::error::{ParseKindError, PermissionError};

/// Account the grants belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

/// Stable identifier of a manageable menu, owned by the menu catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned by the grant store once a grant has been saved.
///
/// Opaque to this crate: stores may hand out integers or strings, and an id is
/// sent back in the shape it arrived in. `Text("007")` and `Numeric(7)` are
/// different grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GrantId {
    Numeric(i64),
    Text(String),
}

impl GrantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }

    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            Self::Numeric(id) => Some(*id),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for GrantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for GrantId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: MenuId,
    pub name: String,
}

impl Menu {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: MenuId(id),
            name: name.into(),
        }
    }
}

/// Actions a grant can cover. The discriminant is the wire-level code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PermissionKind {
    Create = 1,
    Read = 2,
    Update = 3,
    Delete = 4,
}

impl PermissionKind {
    /// Fixed order used by every per-menu record
    pub const ALL: [PermissionKind; 4] = [
        PermissionKind::Create,
        PermissionKind::Read,
        PermissionKind::Update,
        PermissionKind::Delete,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PermissionKind::Create),
            2 => Some(PermissionKind::Read),
            3 => Some(PermissionKind::Update),
            4 => Some(PermissionKind::Delete),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PermissionKind::Create => "create",
            PermissionKind::Read => "read",
            PermissionKind::Update => "update",
            PermissionKind::Delete => "delete",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PermissionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" | "c" | "1" => Ok(PermissionKind::Create),
            "read" | "r" | "2" => Ok(PermissionKind::Read),
            "update" | "u" | "3" => Ok(PermissionKind::Update),
            "delete" | "d" | "4" => Ok(PermissionKind::Delete),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// One boolean grant for an (account, menu, kind) triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub account_id: AccountId,
    pub menu_id: MenuId,
    pub kind: PermissionKind,
    pub status: bool,
    pub persisted_id: Option<GrantId>,
}

impl PermissionGrant {
    /// Fail-closed placeholder for a grant the store has no record of
    pub fn unpersisted(account_id: AccountId, menu_id: MenuId, kind: PermissionKind) -> Self {
        Self {
            account_id,
            menu_id,
            kind,
            status: false,
            persisted_id: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted_id.is_some()
    }
}

/// All four grants of one menu, indexed by `PermissionKind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuGrants {
    pub menu: Menu,
    grants: [PermissionGrant; 4],
}

impl MenuGrants {
    pub fn defaulted(account_id: AccountId, menu: Menu) -> Self {
        let grants = PermissionKind::ALL.map(|kind| PermissionGrant::unpersisted(account_id, menu.id, kind));
        Self { menu, grants }
    }

    pub fn menu_id(&self) -> MenuId {
        self.menu.id
    }

    pub fn grant(&self, kind: PermissionKind) -> &PermissionGrant {
        &self.grants[kind.index()]
    }

    pub(crate) fn grant_mut(&mut self, kind: PermissionKind) -> &mut PermissionGrant {
        &mut self.grants[kind.index()]
    }

    pub fn grants(&self) -> &[PermissionGrant; 4] {
        &self.grants
    }

    pub fn statuses(&self) -> [bool; 4] {
        PermissionKind::ALL.map(|kind| self.grant(kind).status)
    }

    pub fn is_fully_selected(&self) -> bool {
        self.grants.iter().all(|grant| grant.status)
    }

    pub(crate) fn set_all(&mut self, status: bool) {
        for grant in self.grants.iter_mut() {
            grant.status = status;
        }
    }
}

/// Dense per-account view: every catalog menu, every kind.
///
/// Entries keep catalog order. Mutation lives in `permissions::mutator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionMatrix {
    account_id: AccountId,
    entries: Vec<MenuGrants>,
}

impl PermissionMatrix {
    /// Build a matrix from per-menu entries; a repeated menu id keeps its first entry.
    pub fn new(account_id: AccountId, entries: Vec<MenuGrants>) -> Self {
        let mut unique: Vec<MenuGrants> = Vec::with_capacity(entries.len());
        for entry in entries {
            if unique.iter().any(|existing| existing.menu_id() == entry.menu_id()) {
                tracing::warn!("Dropping duplicate entry for menu {} in matrix of account {}", entry.menu_id(), account_id);
                continue;
            }
            unique.push(entry);
        }

        Self {
            account_id,
            entries: unique,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn menus(&self) -> impl Iterator<Item = &MenuGrants> {
        self.entries.iter()
    }

    pub fn grants(&self) -> impl Iterator<Item = &PermissionGrant> {
        self.entries.iter().flat_map(|entry| entry.grants.iter())
    }

    pub fn menu(&self, menu_id: MenuId) -> Result<&MenuGrants, PermissionError> {
        self.entries
            .iter()
            .find(|entry| entry.menu_id() == menu_id)
            .ok_or(PermissionError::UnknownMenu(menu_id))
    }

    pub(crate) fn menu_mut(&mut self, menu_id: MenuId) -> Result<&mut MenuGrants, PermissionError> {
        self.entries
            .iter_mut()
            .find(|entry| entry.menu_id() == menu_id)
            .ok_or(PermissionError::UnknownMenu(menu_id))
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut MenuGrants> {
        self.entries.iter_mut()
    }

    pub fn grant(&self, menu_id: MenuId, kind: PermissionKind) -> Result<&PermissionGrant, PermissionError> {
        Ok(self.menu(menu_id)?.grant(kind))
    }

    pub fn status(&self, menu_id: MenuId, kind: PermissionKind) -> Result<bool, PermissionError> {
        Ok(self.grant(menu_id, kind)?.status)
    }
}
