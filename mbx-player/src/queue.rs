//! Music box queue store
//!
//! Owns the ordered track sequence, the playback cursor, and the loop
//! flag. Mutations are index-based; entries have no identity beyond
//! their position, and duplicates are allowed.
//!
//! The cursor is an `i64` rather than a `usize` because it is not kept
//! inside `[0, len)`: it runs past the end on exhaustion, and a
//! skip-to-index request parks it one slot *before* the target (possibly
//! at -1) so the controller's natural post-track increment lands on the
//! target. The cursor is never used to index the items while out of
//! range.

use crate::error::{Error, Result};
use mbx_common::Track;
use rand::seq::SliceRandom;

/// Cursor-correction policy for mutations
///
/// The stricter defaults diverge from classic music-bot behavior, which
/// left the cursor untouched on clear and remove and accepted the
/// resulting index drift. Both corrections can be switched off to get
/// the permissive behavior back.
#[derive(Debug, Clone, Copy)]
pub struct QueuePolicy {
    /// Reset the cursor to 0 when the queue is cleared
    pub reset_cursor_on_clear: bool,
    /// Clamp the cursor into `[0, len]` after a removal
    pub clamp_cursor_on_remove: bool,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            reset_cursor_on_clear: true,
            clamp_cursor_on_remove: true,
        }
    }
}

/// Ordered track queue with a playback cursor and loop flag
#[derive(Debug)]
pub struct QueueStore {
    items: Vec<Track>,
    cursor: i64,
    looping: bool,
    policy: QueuePolicy,
}

impl QueueStore {
    /// Create an empty queue with the given policy
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            looping: false,
            policy,
        }
    }

    /// Append tracks to the end of the queue; always succeeds
    pub fn append(&mut self, tracks: Vec<Track>) {
        self.items.extend(tracks);
    }

    /// Remove and return the track at `index`
    ///
    /// Fails with `IndexOutOfRange` when `index` is outside `[0, len)`;
    /// the queue is left unmodified on failure.
    pub fn remove_at(&mut self, index: usize) -> Result<Track> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let track = self.items.remove(index);

        if self.policy.clamp_cursor_on_remove {
            self.cursor = self.cursor.clamp(0, self.items.len() as i64);
        }

        Ok(track)
    }

    /// Randomly permute the queue in place (uniform Fisher-Yates)
    ///
    /// No-op when the queue holds fewer than two tracks.
    pub fn shuffle(&mut self) {
        if self.items.len() > 1 {
            self.items.shuffle(&mut rand::thread_rng());
        }
    }

    /// Discard all queued tracks
    ///
    /// The loop flag is never reset here; the cursor is reset only when
    /// the policy says so.
    pub fn clear(&mut self) {
        self.items.clear();
        if self.policy.reset_cursor_on_clear {
            self.cursor = 0;
        }
    }

    /// Flip the loop flag, returning the new value
    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    /// Unconditional cursor overwrite
    ///
    /// Bounds are validated by the caller before invoking; a skip-to
    /// request legitimately sets `target - 1`, which is -1 for target 0.
    pub fn set_cursor(&mut self, cursor: i64) {
        self.cursor = cursor;
    }

    /// Advance the cursor by one slot
    pub fn advance_cursor(&mut self) {
        self.cursor += 1;
    }

    /// Current cursor value (may be outside `[0, len)`)
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue holds no tracks
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the loop flag is set
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// All queued tracks in order
    pub fn tracks(&self) -> &[Track] {
        &self.items
    }

    /// Track at the cursor, if the cursor is in range
    pub fn current(&self) -> Option<&Track> {
        if self.cursor < 0 {
            return None;
        }
        self.items.get(self.cursor as usize)
    }
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new(QueuePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn track(n: u32) -> Track {
        Track::new(
            format!("Track {}", n),
            format!("Artist {}", n),
            format!("https://example.com/watch?v={}", n),
        )
    }

    fn permissive() -> QueuePolicy {
        QueuePolicy {
            reset_cursor_on_clear: false,
            clamp_cursor_on_remove: false,
        }
    }

    #[test]
    fn test_new_queue_is_empty() {
        let queue = QueueStore::default();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.cursor(), 0);
        assert!(!queue.is_looping());
    }

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2)]);
        queue.append(vec![track(1)]);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.tracks()[0], track(1));
        assert_eq!(queue.tracks()[1], track(2));
        assert_eq!(queue.tracks()[2], track(1));
    }

    #[test]
    fn test_length_tracks_appends_minus_removals() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2), track(3)]);
        queue.remove_at(1).unwrap();
        queue.append(vec![track(4)]);

        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_remove_at_returns_removed_track() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2), track(3)]);

        let removed = queue.remove_at(1).unwrap();
        assert_eq!(removed, track(2));
        assert_eq!(queue.tracks(), &[track(1), track(3)]);
    }

    #[test]
    fn test_remove_at_out_of_range_fails_without_mutation() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2)]);

        let err = queue.remove_at(2).unwrap_err();
        match err {
            Error::IndexOutOfRange { index, len } => {
                assert_eq!(index, 2);
                assert_eq!(len, 2);
            }
            other => panic!("Expected IndexOutOfRange, got {:?}", other),
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_at_on_empty_queue_fails() {
        let mut queue = QueueStore::default();
        assert!(matches!(
            queue.remove_at(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_clamps_cursor_by_default() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2), track(3)]);
        queue.set_cursor(3);

        queue.remove_at(2).unwrap();
        assert_eq!(queue.cursor(), 2);
    }

    #[test]
    fn test_remove_leaves_cursor_with_permissive_policy() {
        let mut queue = QueueStore::new(permissive());
        queue.append(vec![track(1), track(2), track(3)]);
        queue.set_cursor(3);

        queue.remove_at(2).unwrap();
        // Index drift accepted: cursor now points past the end
        assert_eq!(queue.cursor(), 3);
    }

    #[test]
    fn test_shuffle_empty_and_single_are_noops() {
        let mut queue = QueueStore::default();
        queue.shuffle();
        assert!(queue.is_empty());

        queue.append(vec![track(1)]);
        queue.shuffle();
        assert_eq!(queue.tracks(), &[track(1)]);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut queue = QueueStore::default();
        let original: Vec<Track> = (0..20).map(track).collect();
        queue.append(original.clone());

        queue.shuffle();

        // Same multiset before and after
        let count = |tracks: &[Track]| {
            let mut m: HashMap<String, usize> = HashMap::new();
            for t in tracks {
                *m.entry(t.source_url.clone()).or_default() += 1;
            }
            m
        };
        assert_eq!(count(&original), count(queue.tracks()));
        assert_eq!(queue.len(), original.len());
    }

    #[test]
    fn test_clear_resets_cursor_by_default_but_not_loop() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2)]);
        queue.set_cursor(2);
        queue.toggle_loop();

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), 0);
        // Loop is a separate toggle; clear never touches it
        assert!(queue.is_looping());
    }

    #[test]
    fn test_clear_keeps_cursor_with_permissive_policy() {
        let mut queue = QueueStore::new(permissive());
        queue.append(vec![track(1), track(2)]);
        queue.set_cursor(2);

        queue.clear();

        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), 2);
    }

    #[test]
    fn test_toggle_loop_double_toggle_returns_to_original() {
        let mut queue = QueueStore::default();
        assert!(!queue.is_looping());

        assert!(queue.toggle_loop());
        assert!(!queue.toggle_loop());
        assert!(!queue.is_looping());
    }

    #[test]
    fn test_set_cursor_is_unconditional() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1)]);

        queue.set_cursor(-1);
        assert_eq!(queue.cursor(), -1);
        assert!(queue.current().is_none());

        queue.set_cursor(99);
        assert_eq!(queue.cursor(), 99);
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_current_follows_cursor() {
        let mut queue = QueueStore::default();
        queue.append(vec![track(1), track(2)]);

        assert_eq!(queue.current(), Some(&track(1)));
        queue.advance_cursor();
        assert_eq!(queue.current(), Some(&track(2)));
        queue.advance_cursor();
        assert_eq!(queue.current(), None);
    }
}
