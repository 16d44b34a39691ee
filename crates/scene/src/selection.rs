use foundation::math::Vec3;

use crate::entity::EntityId;

/// The province currently shown in the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveProvince {
    pub entity: EntityId,
    /// Normalized province key; drives highlighting and dataset lookups.
    pub key: String,
    /// World-space point the overlay is attached to.
    pub anchor: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    Activated(ActiveProvince),
    Cleared,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Highlight {
    Idle,
    Hovered,
    Active,
}

/// Single-province selection plus hover state.
///
/// At most one province is active. Clicking the active province again clears
/// the selection; clicking any other province replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    active: Option<ActiveProvince>,
    hovered: Option<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveProvince> {
        self.active.as_ref()
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn click(&mut self, entity: EntityId, key: &str, anchor: Vec3) -> SelectionChange {
        if self.active.as_ref().is_some_and(|a| a.entity == entity) {
            self.active = None;
            return SelectionChange::Cleared;
        }
        let province = ActiveProvince {
            entity,
            key: key.to_string(),
            anchor,
        };
        self.active = Some(province.clone());
        SelectionChange::Activated(province)
    }

    /// Clears the selection. Returns `true` if something was active.
    pub fn close(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Returns `true` if the hovered province changed.
    pub fn hover(&mut self, entity: Option<EntityId>) -> bool {
        if self.hovered == entity {
            return false;
        }
        self.hovered = entity;
        true
    }

    /// Multi-polygon provinces share a key, so every part of the active
    /// province lights up together.
    pub fn highlight(&self, entity: EntityId, key: &str) -> Highlight {
        if self.active.as_ref().is_some_and(|a| a.key == key) {
            Highlight::Active
        } else if self.hovered == Some(entity) {
            Highlight::Hovered
        } else {
            Highlight::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Highlight, Selection, SelectionChange};
    use crate::entity::EntityId;
    use foundation::math::Vec3;

    #[test]
    fn click_toggles_same_province() {
        let mut sel = Selection::new();
        let bali = EntityId(3);
        let anchor = Vec3::new(1.0, 2.0, 0.5);

        let change = sel.click(bali, "Bali", anchor);
        assert!(matches!(change, SelectionChange::Activated(ref p) if p.key == "Bali"));
        assert_eq!(sel.active().map(|a| a.anchor), Some(anchor));

        assert_eq!(sel.click(bali, "Bali", anchor), SelectionChange::Cleared);
        assert!(sel.active().is_none());
    }

    #[test]
    fn click_other_province_replaces() {
        let mut sel = Selection::new();
        sel.click(EntityId(0), "Banten", Vec3::ZERO);
        let change = sel.click(EntityId(1), "DKIJakarta", Vec3::ZERO);
        assert!(matches!(change, SelectionChange::Activated(ref p) if p.entity == EntityId(1)));
        assert_eq!(sel.active().map(|a| a.key.as_str()), Some("DKIJakarta"));
    }

    #[test]
    fn close_reports_whether_anything_was_open() {
        let mut sel = Selection::new();
        assert!(!sel.close());
        sel.click(EntityId(0), "Bali", Vec3::ZERO);
        assert!(sel.close());
        assert!(sel.active().is_none());
    }

    #[test]
    fn highlight_prefers_active_over_hover() {
        let mut sel = Selection::new();
        assert!(sel.hover(Some(EntityId(2))));
        assert!(!sel.hover(Some(EntityId(2))));
        assert_eq!(sel.highlight(EntityId(2), "Bali"), Highlight::Hovered);
        assert_eq!(sel.highlight(EntityId(4), "Jawa"), Highlight::Idle);

        sel.click(EntityId(2), "NusaTenggaraBarat", Vec3::ZERO);
        assert_eq!(sel.highlight(EntityId(2), "NusaTenggaraBarat"), Highlight::Active);
        // Second part of the same province shares the key.
        assert_eq!(sel.highlight(EntityId(5), "NusaTenggaraBarat"), Highlight::Active);

        assert!(sel.hover(None));
        assert_eq!(sel.hovered(), None);
    }
}
