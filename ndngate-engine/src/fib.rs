use std::collections::HashMap;

use log::{debug, info};

use ndngate_core::{EntryStatus, FaceStatus, Name};

/// Errors from targeted FIB operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FibError {
    #[error("No FIB entry for name: {0}")]
    EntryNotFound(Name),
    #[error("No face {face_id} on FIB entry: {name}")]
    FaceNotFound { name: Name, face_id: u32 },
}

/// A face registered on a FIB entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceEntry {
    pub face_id: u32,
    pub status: FaceStatus,
    /// Monotonic microseconds; refreshed when the face is selected for
    /// forwarding or its status is explicitly set.
    pub last_active: u64,
}

/// A forwarding-table entry carrying liveness state.
///
/// The entry exclusively owns its face list; insertion order of faces is
/// preserved and drives egress ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibEntry {
    pub name: Name,
    pub status: EntryStatus,
    /// Monotonic microseconds; refreshed on every successful active lookup
    /// and on explicit status changes.
    pub last_used: u64,
    /// Tie-break weight among overlapping entries. Consumer-defined; never
    /// auto-adjusted here.
    pub priority: u32,
    pub faces: Vec<FaceEntry>,
}

impl FibEntry {
    pub fn new(name: Name, priority: u32, now: u64) -> Self {
        Self {
            name,
            status: EntryStatus::Active,
            last_used: now,
            priority,
            faces: Vec::new(),
        }
    }

    /// Ids of the Active faces, in face-list order, refreshing each
    /// returned face's `last_active`. An entry with no faces yields an
    /// empty list.
    pub fn active_face_ids(&mut self, now: u64) -> Vec<u32> {
        let mut face_ids = Vec::new();
        for face in &mut self.faces {
            if face.status == FaceStatus::Active {
                face.last_active = now;
                face_ids.push(face.face_id);
            }
        }
        face_ids
    }

    pub fn face(&self, face_id: u32) -> Option<&FaceEntry> {
        self.faces.iter().find(|f| f.face_id == face_id)
    }

    fn face_mut(&mut self, face_id: u32) -> Option<&mut FaceEntry> {
        self.faces.iter_mut().find(|f| f.face_id == face_id)
    }
}

/// Per-status entry counts from a full-table scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FibStatistics {
    pub active: usize,
    pub inactive: usize,
    pub suspended: usize,
}

/// FIB liveness table: name-prefix keyed entries with active-only lookup.
///
/// The two-stage decay policy keeps demotion and deletion separate: an
/// entry demoted by [`FibTable::auto_demote`] drops out of the forwarding
/// path immediately but stays inspectable until the next
/// [`FibTable::cleanup_inactive`] pass removes it.
#[derive(Debug, Default)]
pub struct FibTable {
    entries: HashMap<Name, FibEntry>,
}

impl FibTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &Name) -> Option<&FibEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FibEntry> {
        self.entries.values()
    }

    /// Install an entry, Active with an empty face list. Replaces any
    /// existing entry under the same name.
    pub fn insert(&mut self, name: Name, priority: u32, now: u64) {
        info!("Adding FIB entry for prefix: {}", name);
        self.entries
            .insert(name.clone(), FibEntry::new(name, priority, now));
    }

    pub fn remove(&mut self, name: &Name) -> Option<FibEntry> {
        let entry = self.entries.remove(name);
        if entry.is_some() {
            info!("Removed FIB entry for prefix: {}", name);
        }
        entry
    }

    /// Install a face on an entry, Active. Re-adding an existing face id
    /// re-activates it instead of duplicating.
    pub fn add_face(&mut self, name: &Name, face_id: u32, now: u64) -> Result<(), FibError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| FibError::EntryNotFound(name.clone()))?;

        if let Some(face) = entry.face_mut(face_id) {
            face.status = FaceStatus::Active;
            face.last_active = now;
        } else {
            entry.faces.push(FaceEntry {
                face_id,
                status: FaceStatus::Active,
                last_active: now,
            });
        }
        debug!("Registered face {} on {}", face_id, name);
        Ok(())
    }

    /// Set an entry's status by exact name. A prefix match is not enough;
    /// an unknown name is `EntryNotFound`.
    pub fn set_status(
        &mut self,
        name: &Name,
        status: EntryStatus,
        now: u64,
    ) -> Result<(), FibError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| FibError::EntryNotFound(name.clone()))?;

        entry.status = status;
        entry.last_used = now;
        info!("FIB entry {} status set to {}", name, status);
        Ok(())
    }

    /// Status by exact name. Absence is conservatively Inactive, never an
    /// error.
    pub fn get_status(&self, name: &Name) -> EntryStatus {
        self.entries
            .get(name)
            .map(|e| e.status)
            .unwrap_or(EntryStatus::Inactive)
    }

    /// Longest-prefix match restricted to Active entries.
    ///
    /// Starting from the full name, the exact prefix is looked up; a hit
    /// that is not Active does not stop the search, so an Inactive or
    /// Suspended entry at a longer prefix never shadows a shorter Active
    /// one. The search stops with `None` once the prefix is empty; the
    /// empty name is never looked up, so no entry can act as a default
    /// route. A hit refreshes `last_used`.
    pub fn search_active(&mut self, name: &Name, now: u64) -> Option<&mut FibEntry> {
        let mut candidate = Some(name.clone()).filter(|n| !n.is_empty());
        let mut hit = None;

        while let Some(prefix) = candidate {
            match self.entries.get(&prefix) {
                Some(entry) if entry.status == EntryStatus::Active => {
                    hit = Some(prefix);
                    break;
                }
                _ => candidate = prefix.parent().filter(|p| !p.is_empty()),
            }
        }

        let key = hit?;
        debug!("Active FIB match for {} at prefix {}", name, key);
        let entry = self.entries.get_mut(&key)?;
        entry.last_used = now;
        Some(entry)
    }

    /// Set one face's status on an entry. `FaceNotFound` when the face id
    /// is absent from the entry's face list.
    pub fn set_face_status(
        &mut self,
        name: &Name,
        face_id: u32,
        status: FaceStatus,
        now: u64,
    ) -> Result<(), FibError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| FibError::EntryNotFound(name.clone()))?;

        let face = entry.face_mut(face_id).ok_or_else(|| FibError::FaceNotFound {
            name: name.clone(),
            face_id,
        })?;

        face.status = status;
        face.last_active = now;
        info!("Face {} on {} status set to {}", face_id, name, status);
        Ok(())
    }

    /// Remove every Inactive entry, returning the count removed. Active
    /// and Suspended entries are untouched.
    pub fn cleanup_inactive(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.status != EntryStatus::Inactive);
        let removed = before - self.entries.len();
        if removed > 0 {
            info!("Cleaned up {} inactive FIB entries", removed);
        }
        removed
    }

    /// Demote every Active entry idle for strictly longer than
    /// `inactive_threshold_us` to Inactive, returning the count demoted.
    /// An entry exactly at the threshold stays Active.
    pub fn auto_demote(&mut self, now: u64, inactive_threshold_us: u64) -> usize {
        let mut demoted = 0;
        for entry in self.entries.values_mut() {
            if entry.status == EntryStatus::Active
                && now.saturating_sub(entry.last_used) > inactive_threshold_us
            {
                entry.status = EntryStatus::Inactive;
                debug!("Auto-demoted idle FIB entry: {}", entry.name);
                demoted += 1;
            }
        }
        if demoted > 0 {
            info!("Auto-demoted {} idle FIB entries", demoted);
        }
        demoted
    }

    /// Full-table scan of per-status counts. The status enum is total, so
    /// every entry lands in one of the three buckets; if a wider status
    /// set is ever carried on the wire, unknown values decode to Inactive
    /// before reaching this table.
    pub fn statistics(&self) -> FibStatistics {
        let mut stats = FibStatistics::default();
        for entry in self.entries.values() {
            match entry.status {
                EntryStatus::Active => stats.active += 1,
                EntryStatus::Inactive => stats.inactive += 1,
                EntryStatus::Suspended => stats.suspended += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    fn table_with(entries: &[(&str, EntryStatus)]) -> FibTable {
        let mut table = FibTable::new();
        for (uri, status) in entries {
            table.insert(name(uri), 0, 100);
            table.set_status(&name(uri), *status, 100).unwrap();
        }
        table
    }

    #[test]
    fn test_set_status_requires_exact_match() {
        let mut table = table_with(&[("/a/b", EntryStatus::Active)]);
        assert!(table.set_status(&name("/a/b"), EntryStatus::Suspended, 200).is_ok());
        assert_eq!(
            table.set_status(&name("/a"), EntryStatus::Active, 200),
            Err(FibError::EntryNotFound(name("/a")))
        );
        // prefix of a registered name is not an exact match either
        assert_eq!(
            table.set_status(&name("/a/b/c"), EntryStatus::Active, 200),
            Err(FibError::EntryNotFound(name("/a/b/c")))
        );
    }

    #[test]
    fn test_set_status_refreshes_last_used() {
        let mut table = table_with(&[("/a", EntryStatus::Active)]);
        table.set_status(&name("/a"), EntryStatus::Suspended, 777).unwrap();
        assert_eq!(table.get(&name("/a")).unwrap().last_used, 777);
    }

    #[test]
    fn test_get_status_absent_is_inactive() {
        let table = table_with(&[("/a", EntryStatus::Active)]);
        assert_eq!(table.get_status(&name("/missing")), EntryStatus::Inactive);
        assert_eq!(table.get_status(&name("/a")), EntryStatus::Active);
    }

    #[test]
    fn test_search_active_prefix_shortening() {
        let mut table = table_with(&[("/a/b", EntryStatus::Active)]);
        let entry = table.search_active(&name("/a/b/c/d"), 500).unwrap();
        assert_eq!(entry.name, name("/a/b"));
        assert_eq!(entry.last_used, 500);
    }

    #[test]
    fn test_search_active_skips_inactive_shadow() {
        // a longer Inactive entry must not shadow a shorter Active one
        let mut table = table_with(&[
            ("/a/b/c", EntryStatus::Inactive),
            ("/a/b", EntryStatus::Suspended),
            ("/a", EntryStatus::Active),
        ]);
        let entry = table.search_active(&name("/a/b/c"), 500).unwrap();
        assert_eq!(entry.name, name("/a"));
    }

    #[test]
    fn test_search_active_none_when_nothing_live() {
        let mut table = table_with(&[("/a/b", EntryStatus::Inactive)]);
        assert!(table.search_active(&name("/a/b/c"), 500).is_none());
        assert!(table.search_active(&name("/unrelated"), 500).is_none());
    }

    #[test]
    fn test_search_active_never_reaches_empty_name() {
        // an entry registered under the empty name must not become a
        // default route; the search stops before the prefix is empty
        let mut table = FibTable::new();
        table.insert(Name::new(), 0, 100);

        assert!(table.search_active(&name("/a/b"), 500).is_none());
        assert!(table.search_active(&name("/a"), 500).is_none());
        // an empty query name finds nothing either
        assert!(table.search_active(&Name::new(), 500).is_none());
        assert_eq!(table.get(&Name::new()).unwrap().last_used, 100);
    }

    #[test]
    fn test_search_active_does_not_touch_skipped_entries() {
        let mut table = table_with(&[
            ("/a/b", EntryStatus::Inactive),
            ("/a", EntryStatus::Active),
        ]);
        table.search_active(&name("/a/b"), 900).unwrap();
        assert_eq!(table.get(&name("/a/b")).unwrap().last_used, 100);
        assert_eq!(table.get(&name("/a")).unwrap().last_used, 900);
    }

    #[test]
    fn test_active_face_ids_order_and_filter() {
        let mut table = table_with(&[("/a", EntryStatus::Active)]);
        table.add_face(&name("/a"), 3, 100).unwrap();
        table.add_face(&name("/a"), 1, 100).unwrap();
        table.add_face(&name("/a"), 2, 100).unwrap();
        table
            .set_face_status(&name("/a"), 1, FaceStatus::Inactive, 150)
            .unwrap();

        let entry = table.search_active(&name("/a"), 200).unwrap();
        assert_eq!(entry.active_face_ids(200), vec![3, 2]);
        // returned faces got their last_active refreshed, skipped one did not
        assert_eq!(entry.face(3).unwrap().last_active, 200);
        assert_eq!(entry.face(2).unwrap().last_active, 200);
        assert_eq!(entry.face(1).unwrap().last_active, 150);
    }

    #[test]
    fn test_entry_with_no_faces_yields_empty() {
        let mut table = table_with(&[("/a", EntryStatus::Active)]);
        let entry = table.search_active(&name("/a"), 200).unwrap();
        assert!(entry.active_face_ids(200).is_empty());
    }

    #[test]
    fn test_add_face_reactivates_existing() {
        let mut table = table_with(&[("/a", EntryStatus::Active)]);
        table.add_face(&name("/a"), 7, 100).unwrap();
        table
            .set_face_status(&name("/a"), 7, FaceStatus::Inactive, 150)
            .unwrap();
        table.add_face(&name("/a"), 7, 300).unwrap();

        let entry = table.get(&name("/a")).unwrap();
        assert_eq!(entry.faces.len(), 1);
        assert_eq!(entry.face(7).unwrap().status, FaceStatus::Active);
        assert_eq!(entry.face(7).unwrap().last_active, 300);
    }

    #[test]
    fn test_set_face_status_not_found() {
        let mut table = table_with(&[("/a", EntryStatus::Active)]);
        table.add_face(&name("/a"), 7, 100).unwrap();
        assert_eq!(
            table.set_face_status(&name("/a"), 9, FaceStatus::Inactive, 100),
            Err(FibError::FaceNotFound {
                name: name("/a"),
                face_id: 9
            })
        );
        assert!(matches!(
            table.set_face_status(&name("/x"), 7, FaceStatus::Inactive, 100),
            Err(FibError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_cleanup_removes_only_inactive() {
        let mut table = table_with(&[
            ("/keep/active", EntryStatus::Active),
            ("/keep/suspended", EntryStatus::Suspended),
            ("/drop/one", EntryStatus::Inactive),
            ("/drop/two", EntryStatus::Inactive),
        ]);
        table.add_face(&name("/keep/active"), 4, 120).unwrap();
        let survivor_before = table.get(&name("/keep/active")).unwrap().clone();

        assert_eq!(table.cleanup_inactive(), 2);
        assert_eq!(table.len(), 2);
        // survivors are untouched: name, faces, timestamps all identical
        assert_eq!(table.get(&name("/keep/active")), Some(&survivor_before));
        assert!(table.get(&name("/keep/suspended")).is_some());
        assert_eq!(table.cleanup_inactive(), 0);
    }

    #[test]
    fn test_auto_demote_threshold_is_strict() {
        let mut table = table_with(&[("/a", EntryStatus::Active), ("/b", EntryStatus::Active)]);
        table.set_status(&name("/b"), EntryStatus::Active, 400).unwrap();

        // /a last used at 100, /b at 400; threshold 300 at now=400:
        // 400 - 100 == 300 is not strictly greater, so nothing demotes
        assert_eq!(table.auto_demote(400, 300), 0);
        assert_eq!(table.get_status(&name("/a")), EntryStatus::Active);

        assert_eq!(table.auto_demote(401, 300), 1);
        assert_eq!(table.get_status(&name("/a")), EntryStatus::Inactive);
        assert_eq!(table.get_status(&name("/b")), EntryStatus::Active);
    }

    #[test]
    fn test_auto_demote_ignores_suspended() {
        let mut table = table_with(&[("/a", EntryStatus::Suspended)]);
        assert_eq!(table.auto_demote(1_000_000, 10), 0);
        assert_eq!(table.get_status(&name("/a")), EntryStatus::Suspended);
    }

    #[test]
    fn test_statistics_counts() {
        let table = table_with(&[
            ("/a", EntryStatus::Active),
            ("/b", EntryStatus::Active),
            ("/c", EntryStatus::Inactive),
            ("/d", EntryStatus::Suspended),
        ]);
        assert_eq!(
            table.statistics(),
            FibStatistics {
                active: 2,
                inactive: 1,
                suspended: 1
            }
        );
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut table = FibTable::new();
        table.insert(name("/a"), 1, 100);
        table.add_face(&name("/a"), 7, 100).unwrap();
        table.insert(name("/a"), 9, 200);

        let entry = table.get(&name("/a")).unwrap();
        assert_eq!(entry.priority, 9);
        assert!(entry.faces.is_empty());
    }
}
