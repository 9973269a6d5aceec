use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::eligibility::Tier;
use crate::profile::StudentProfile;
use crate::session::{AllocationSession, RemovalOutcome, SessionError, SessionView};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    Created,
    Replaced,
    Unchanged,
}

/// One isolated session per key. The catalog is shared read-only; no mutable
/// state crosses keys.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, AllocationSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AllocationSession>> {
        self.sessions.lock().expect("session store mutex poisoned")
    }

    pub fn create(&self, catalog: &Catalog, profile: StudentProfile, total: u32) -> SessionView {
        let session_id = Uuid::new_v4().to_string();
        let session = AllocationSession::build(catalog, profile, total);
        let view = session.view(&session_id);
        self.lock().insert(session_id.clone(), session);
        info!("created session {session_id}");
        view
    }

    /// Rebuilds the session from scratch when any input changed; identical
    /// inputs keep the current shown/available state.
    pub fn submit(
        &self,
        session_id: &str,
        catalog: &Catalog,
        profile: StudentProfile,
        total: u32,
    ) -> Result<(SubmitStatus, SessionView), SessionError> {
        let mut sessions = self.lock();
        let existing = sessions
            .get(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))?;
        if existing.matches_inputs(&profile, total, catalog) {
            return Ok((SubmitStatus::Unchanged, existing.view(session_id)));
        }

        let rebuilt = AllocationSession::build(catalog, profile, total);
        let view = rebuilt.view(session_id);
        sessions.insert(session_id.to_string(), rebuilt);
        info!("rebuilt session {session_id} after input change");
        Ok((SubmitStatus::Replaced, view))
    }

    pub fn view(&self, session_id: &str) -> Result<SessionView, SessionError> {
        self.lock()
            .get(session_id)
            .map(|session| session.view(session_id))
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))
    }

    pub fn remove_item(
        &self,
        session_id: &str,
        tier: Tier,
        item_id: &str,
    ) -> Result<RemovalOutcome, SessionError> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.to_string()))?;
        session.remove_and_replenish(tier, item_id)
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.lock().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::loader::load_builtin;
    use crate::criteria::Subject;
    use crate::profile::Allocation;

    fn profile() -> StudentProfile {
        StudentProfile::new()
            .with_score(Subject::Chinese, 14)
            .with_score(Subject::English, 12)
    }

    #[test]
    fn identical_resubmission_keeps_state() {
        let loaded = load_builtin();
        let store = SessionStore::new();
        let created = store.create(&loaded.catalog, profile(), 6);
        let (status, view) = store
            .submit(&created.session_id, &loaded.catalog, profile(), 6)
            .expect("known session");
        assert_eq!(status, SubmitStatus::Unchanged);
        assert_eq!(view.created_at, created.created_at);
    }

    #[test]
    fn changed_inputs_rebuild_the_whole_session() {
        let loaded = load_builtin();
        let store = SessionStore::new();
        let created = store.create(&loaded.catalog, profile(), 6);
        let changed = profile().with_allocation(Allocation::new(3, 2, 1));
        let (status, view) = store
            .submit(&created.session_id, &loaded.catalog, changed, 6)
            .expect("known session");
        assert_eq!(status, SubmitStatus::Replaced);
        let old_ids: Vec<&str> = created
            .tiers
            .iter()
            .flat_map(|t| t.items.iter().map(|i| i.id.as_str()))
            .collect();
        assert!(view
            .tiers
            .iter()
            .flat_map(|t| t.items.iter())
            .all(|item| !old_ids.contains(&item.id.as_str())));
    }

    #[test]
    fn sessions_are_isolated() {
        let loaded = load_builtin();
        let store = SessionStore::new();
        let first = store.create(&loaded.catalog, profile(), 6);
        let second = store.create(&loaded.catalog, profile(), 6);
        assert_eq!(store.len(), 2);

        let item = first
            .tiers
            .iter()
            .find_map(|t| t.items.first())
            .expect("at least one recommendation");
        store
            .remove_item(&first.session_id, item.tier, &item.id)
            .expect("removal in first session");
        let second_after = store.view(&second.session_id).expect("second session");
        for (before, after) in second.tiers.iter().zip(second_after.tiers.iter()) {
            assert_eq!(before.counts, after.counts);
        }

        assert!(matches!(
            store.remove_item("missing", Tier::Realistic, "x"),
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(store.delete(&first.session_id));
        assert_eq!(store.len(), 1);
    }
}
