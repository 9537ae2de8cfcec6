//! Live platform track table.

use interlock_core::{Track, TrackId, TrackState, TrainId};
use interlock_twin::TrackTable;

/// Owns the live track records.
///
/// Read access is public. Records change only by adopting a verified
/// effect through the station.
#[derive(Clone, Debug, Default)]
pub struct TrackManager {
    tracks: TrackTable,
}

impl TrackManager {
    /// A manager over `tracks`, in iteration order.
    pub fn new(tracks: impl IntoIterator<Item = Track>) -> Self {
        Self {
            tracks: tracks.into_iter().map(|t| (t.id().clone(), t)).collect(),
        }
    }

    /// The full table.
    pub fn table(&self) -> &TrackTable {
        &self.tracks
    }

    /// Look up one track.
    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// All tracks in table order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// The track held by `train`, if any.
    pub fn track_for_train(&self, train: &TrainId) -> Option<&Track> {
        self.tracks
            .values()
            .find(|t| t.assigned_train() == Some(train))
    }

    /// The first FREE track in table order.
    pub fn first_free(&self) -> Option<&Track> {
        self.tracks.values().find(|t| t.state() == TrackState::Free)
    }

    /// Number of FREE tracks.
    pub fn free_count(&self) -> usize {
        self.tracks
            .values()
            .filter(|t| t.state() == TrackState::Free)
            .count()
    }

    pub(crate) fn adopt(&mut self, track: Track) {
        debug_assert!(self.tracks.contains_key(track.id()));
        self.tracks.insert(track.id().clone(), track);
    }

    pub(crate) fn count_down(&mut self, secs: u64) {
        for t in self.tracks.values_mut() {
            t.count_down(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TrackManager {
        TrackManager::new(["P1", "P2", "P3"].map(|id| Track::new(id, 120)))
    }

    #[test]
    fn queries_follow_adopted_records() {
        let mut m = manager();
        assert_eq!(m.free_count(), 3);
        assert_eq!(m.first_free().unwrap().id(), &TrackId::from("P1"));

        let mut p1 = m.track(&TrackId::from("P1")).unwrap().clone();
        p1.reserve(TrainId::from("T001"), Some(90)).unwrap();
        m.adopt(p1);

        assert_eq!(m.free_count(), 2);
        assert_eq!(m.first_free().unwrap().id(), &TrackId::from("P2"));
        assert_eq!(
            m.track_for_train(&TrainId::from("T001")).unwrap().id(),
            &TrackId::from("P1")
        );
        let order: Vec<_> = m.tracks().map(|t| t.id().as_str()).collect();
        assert_eq!(order, ["P1", "P2", "P3"]);
    }

    #[test]
    fn count_down_touches_every_eta() {
        let mut m = manager();
        let mut p2 = m.track(&TrackId::from("P2")).unwrap().clone();
        p2.reserve(TrainId::from("T002"), Some(100)).unwrap();
        m.adopt(p2);
        m.count_down(40);
        assert_eq!(m.track(&TrackId::from("P2")).unwrap().eta_secs(), Some(60));
        assert_eq!(m.track(&TrackId::from("P1")).unwrap().eta_secs(), None);
    }
}
