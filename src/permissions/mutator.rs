// Local, synchronous edits to a PermissionMatrix. Nothing here talks to a store
// and nothing here touches persisted ids.

use crate::permissions::error::PermissionError;
use crate::permissions::model::{MenuId, PermissionKind, PermissionMatrix};

impl PermissionMatrix {
    /// Flip a single (menu, kind) cell
    pub fn toggle_kind(&mut self, menu_id: MenuId, kind: PermissionKind) -> Result<(), PermissionError> {
        let grant = self.menu_mut(menu_id)?.grant_mut(kind);
        grant.status = !grant.status;
        Ok(())
    }

    /// Set a single (menu, kind) cell to an explicit value
    pub fn set_kind(&mut self, menu_id: MenuId, kind: PermissionKind, status: bool) -> Result<(), PermissionError> {
        self.menu_mut(menu_id)?.grant_mut(kind).status = status;
        Ok(())
    }

    /// Clear all four kinds if they are all set, otherwise set all four
    pub fn toggle_all_kinds_for_menu(&mut self, menu_id: MenuId) -> Result<(), PermissionError> {
        let entry = self.menu_mut(menu_id)?;
        let all_selected = entry.is_fully_selected();
        entry.set_all(!all_selected);
        Ok(())
    }

    /// Clear every cell if the whole matrix is selected, otherwise set every cell
    pub fn toggle_all_menus(&mut self) {
        let all_selected = self.is_fully_selected();
        for entry in self.entries_mut() {
            entry.set_all(!all_selected);
        }
    }

    pub fn is_menu_fully_selected(&self, menu_id: MenuId) -> Result<bool, PermissionError> {
        Ok(self.menu(menu_id)?.is_fully_selected())
    }

    /// True when every menu is fully selected (vacuously true for no menus)
    pub fn is_fully_selected(&self) -> bool {
        self.menus().all(|entry| entry.is_fully_selected())
    }
}

#[cfg(test)]
mod tests {
    use crate::permissions::model::{AccountId, GrantId, Menu, MenuGrants, MenuId, PermissionKind, PermissionMatrix};
    use PermissionKind::*;

    fn matrix(menus: &[(i64, [bool; 4])]) -> PermissionMatrix {
        let account = AccountId(42);
        let entries = menus
            .iter()
            .map(|(id, statuses)| {
                let mut entry = MenuGrants::defaulted(account, Menu::new(*id, format!("menu-{id}")));
                for (kind, status) in PermissionKind::ALL.into_iter().zip(statuses) {
                    entry.grant_mut(kind).status = *status;
                }
                entry
            })
            .collect();
        PermissionMatrix::new(account, entries)
    }

    fn statuses(matrix: &PermissionMatrix, menu: i64) -> [bool; 4] {
        matrix.menu(MenuId(menu)).unwrap().statuses()
    }

    #[test]
    fn test_toggle_kind_flips_one_cell() {
        let mut m = matrix(&[(1, [false, true, false, false]), (2, [false; 4])]);
        m.toggle_kind(MenuId(1), Create).unwrap();
        assert_eq!(statuses(&m, 1), [true, true, false, false]);
        assert_eq!(statuses(&m, 2), [false; 4]);

        m.toggle_kind(MenuId(1), Create).unwrap();
        assert_eq!(statuses(&m, 1), [false, true, false, false]);
    }

    #[test]
    fn test_toggle_kind_keeps_persisted_id() {
        let mut m = matrix(&[(1, [false; 4])]);
        m.menu_mut(MenuId(1)).unwrap().grant_mut(Read).persisted_id = Some(GrantId::from("g-9"));

        m.toggle_kind(MenuId(1), Read).unwrap();
        let grant = m.grant(MenuId(1), Read).unwrap();
        assert!(grant.status);
        assert_eq!(grant.persisted_id, Some(GrantId::from("g-9")));
    }

    #[test]
    fn test_menu_toggle_all_from_mixed_then_full() {
        let mut m = matrix(&[(1, [true, false, true, false])]);
        assert!(!m.is_menu_fully_selected(MenuId(1)).unwrap());

        m.toggle_all_kinds_for_menu(MenuId(1)).unwrap();
        assert_eq!(statuses(&m, 1), [true; 4]);
        assert!(m.is_menu_fully_selected(MenuId(1)).unwrap());

        m.toggle_all_kinds_for_menu(MenuId(1)).unwrap();
        assert_eq!(statuses(&m, 1), [false; 4]);
    }

    #[test]
    fn test_menu_toggle_all_leaves_other_menus() {
        let mut m = matrix(&[(1, [false; 4]), (2, [true, false, false, true])]);
        m.toggle_all_kinds_for_menu(MenuId(1)).unwrap();
        assert_eq!(statuses(&m, 2), [true, false, false, true]);
    }

    #[test]
    fn test_global_toggle_sets_everything_when_any_menu_is_partial() {
        let mut m = matrix(&[(1, [true; 4]), (2, [true, true, false, true])]);
        assert!(!m.is_fully_selected());

        m.toggle_all_menus();
        assert!(m.is_fully_selected());
        assert_eq!(statuses(&m, 1), [true; 4]);
        assert_eq!(statuses(&m, 2), [true; 4]);

        m.toggle_all_menus();
        assert_eq!(statuses(&m, 1), [false; 4]);
        assert_eq!(statuses(&m, 2), [false; 4]);
    }

    #[test]
    fn test_fully_selected_is_recomputed_after_each_edit() {
        let mut m = matrix(&[(1, [true; 4]), (2, [true; 4])]);
        assert!(m.is_fully_selected());

        m.toggle_kind(MenuId(2), Delete).unwrap();
        assert!(!m.is_fully_selected());
        assert!(m.is_menu_fully_selected(MenuId(1)).unwrap());
        assert!(!m.is_menu_fully_selected(MenuId(2)).unwrap());

        m.set_kind(MenuId(2), Delete, true).unwrap();
        assert!(m.is_fully_selected());
    }

    #[test]
    fn test_empty_matrix_global_toggle_is_noop() {
        let mut m = matrix(&[]);
        assert!(m.is_fully_selected());
        m.toggle_all_menus();
        assert!(m.is_empty());
    }

    #[test]
    fn test_unknown_menu_is_rejected_without_changes() {
        let mut m = matrix(&[(1, [false; 4])]);
        let before = m.clone();
        assert!(m.toggle_kind(MenuId(5), Read).is_err());
        assert!(m.toggle_all_kinds_for_menu(MenuId(5)).is_err());
        assert!(m.is_menu_fully_selected(MenuId(5)).is_err());
        assert_eq!(m, before);
    }
}
