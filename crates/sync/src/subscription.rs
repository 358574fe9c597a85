//! Live channel subscription manager
//!
//! Tracks the single subscription of a mission view, keyed by
//! `(mission_id, is_active)`. Reconciling against a new key always closes
//! the current subscription before opening the next one, so two channels
//! are never live at once. Every subscription carries a serial number; the
//! view drops anything reported by a subscription that is no longer current.

use surveylink_mission::MissionId;

/// Identity of one opened subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    /// Mission identity the channel was opened for
    pub mission_id: MissionId,
    /// Monotonic serial, unique per manager
    pub serial: u64,
}

/// Change the runtime must apply, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionChange {
    /// Tear down this channel
    Close(SubscriptionId),
    /// Connect a new channel
    Open(SubscriptionId),
}

/// Close-before-open subscription state machine
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    next_serial: u64,
    current: Option<SubscriptionId>,
    // Mission whose channel ended on its own; not reopened for the same key.
    lost: Option<MissionId>,
}

impl SubscriptionManager {
    /// Empty manager with no subscription
    pub fn new() -> Self {
        Self::default()
    }

    /// Current live subscription, if any
    pub fn current(&self) -> Option<&SubscriptionId> {
        self.current.as_ref()
    }

    /// Whether `id` is the live subscription
    pub fn is_current(&self, id: &SubscriptionId) -> bool {
        self.current.as_ref() == Some(id)
    }

    /// Move to the desired key.
    ///
    /// `desired` is the mission identity whose status is active, or `None`
    /// when no channel should be open.
    pub fn reconcile(&mut self, desired: Option<&MissionId>) -> Vec<SubscriptionChange> {
        if let (Some(current), Some(wanted)) = (&self.current, desired) {
            if &current.mission_id == wanted {
                return Vec::new();
            }
        }

        let mut changes = Vec::new();
        if let Some(current) = self.current.take() {
            changes.push(SubscriptionChange::Close(current));
        }

        match desired {
            Some(wanted) if self.lost.as_ref() == Some(wanted) => {}
            Some(wanted) => {
                self.lost = None;
                self.next_serial += 1;
                let id = SubscriptionId {
                    mission_id: wanted.clone(),
                    serial: self.next_serial,
                };
                self.current = Some(id.clone());
                changes.push(SubscriptionChange::Open(id));
            }
            None => self.lost = None,
        }
        changes
    }

    /// Record that `id` ended without being asked to.
    ///
    /// Returns false if `id` was already superseded.
    pub fn on_lost(&mut self, id: &SubscriptionId) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.current = None;
        self.lost = Some(id.mission_id.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(mission: &str, serial: u64) -> SubscriptionId {
        SubscriptionId {
            mission_id: MissionId::new(mission),
            serial,
        }
    }

    #[test]
    fn test_open_once_for_same_key() {
        let mut manager = SubscriptionManager::new();
        let m1 = MissionId::new("m-1");

        assert_eq!(
            manager.reconcile(Some(&m1)),
            vec![SubscriptionChange::Open(id("m-1", 1))]
        );
        assert!(manager.reconcile(Some(&m1)).is_empty());
        assert!(manager.is_current(&id("m-1", 1)));
    }

    #[test]
    fn test_identity_change_closes_before_open() {
        let mut manager = SubscriptionManager::new();
        manager.reconcile(Some(&MissionId::new("m-1")));

        let changes = manager.reconcile(Some(&MissionId::new("m-2")));
        assert_eq!(
            changes,
            vec![
                SubscriptionChange::Close(id("m-1", 1)),
                SubscriptionChange::Open(id("m-2", 2)),
            ]
        );
        assert!(!manager.is_current(&id("m-1", 1)));
    }

    #[test]
    fn test_inactive_closes() {
        let mut manager = SubscriptionManager::new();
        manager.reconcile(Some(&MissionId::new("m-1")));

        assert_eq!(
            manager.reconcile(None),
            vec![SubscriptionChange::Close(id("m-1", 1))]
        );
        assert!(manager.current().is_none());
        assert!(manager.reconcile(None).is_empty());
    }

    #[test]
    fn test_lost_channel_not_reopened_for_same_key() {
        let mut manager = SubscriptionManager::new();
        let m1 = MissionId::new("m-1");
        manager.reconcile(Some(&m1));

        assert!(manager.on_lost(&id("m-1", 1)));
        assert!(manager.reconcile(Some(&m1)).is_empty());

        assert_eq!(
            manager.reconcile(Some(&MissionId::new("m-2"))),
            vec![SubscriptionChange::Open(id("m-2", 2))]
        );
    }

    #[test]
    fn test_superseded_loss_ignored() {
        let mut manager = SubscriptionManager::new();
        manager.reconcile(Some(&MissionId::new("m-1")));
        manager.reconcile(Some(&MissionId::new("m-2")));

        assert!(!manager.on_lost(&id("m-1", 1)));
        assert!(manager.is_current(&id("m-2", 2)));
    }
}
