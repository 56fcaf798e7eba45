//! Per-instance shadow state
//!
//! Holds what the current unit of work learned about one tracked instance:
//! the change set from the last `before_save` and the association shadows
//! written so far.

use super::detector::ChangeSet;
use super::rows::PendingAssociationShadow;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowState {
    updated_attributes: Option<ChangeSet>,
    updated_associations: Vec<PendingAssociationShadow>,
}

impl ShadowState {
    /// Change set recorded by the last `before_save`
    pub fn updated_attributes(&self) -> Option<&ChangeSet> {
        self.updated_attributes.as_ref()
    }

    /// Association shadows written during the current unit of work
    pub fn updated_associations(&self) -> &[PendingAssociationShadow] {
        &self.updated_associations
    }

    pub fn record_changes(&mut self, changes: ChangeSet) {
        self.updated_attributes = Some(changes);
    }

    pub fn push_association(&mut self, entry: PendingAssociationShadow) {
        self.updated_associations.push(entry);
    }

    /// Drain the association buffer, ending its unit of work
    pub fn take_associations(&mut self) -> Vec<PendingAssociationShadow> {
        std::mem::take(&mut self.updated_associations)
    }

    pub fn clear(&mut self) {
        self.updated_attributes = None;
        self.updated_associations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use crate::shadow::rows::ShadowAction;

    fn entry(id: i64) -> PendingAssociationShadow {
        PendingAssociationShadow {
            association: "line_items".into(),
            action: ShadowAction::Added,
            record_id: RecordId::new(id),
            record_version: None,
            keys: Default::default(),
        }
    }

    #[test]
    fn test_buffer_accumulates_and_drains() {
        let mut state = ShadowState::default();
        state.push_association(entry(1));
        state.push_association(entry(2));
        assert_eq!(state.updated_associations().len(), 2);

        let drained = state.take_associations();
        assert_eq!(drained.len(), 2);
        assert!(state.updated_associations().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut state = ShadowState::default();
        state.record_changes(ChangeSet::default());
        state.push_association(entry(1));

        state.clear();
        assert!(state.updated_attributes().is_none());
        assert!(state.updated_associations().is_empty());
    }
}
