use super::Cue;

use std::fmt::Debug;
use std::ops::{Index, IndexMut, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CueIndex(usize);

/// A point in time in whole milliseconds, used as the interval key for cue lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Milliseconds(pub i64);

impl Milliseconds {
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "cue times are far below the range where this matters"
    )]
    pub fn from_seconds(seconds: f64) -> Self {
        Self((seconds * 1000.0).round() as i64)
    }
}

/// Ordered collection of [`Cue`]s, queryable by time.
///
/// Like an event track, this is a combination of 3 data structures:
///  - an array (`Vec`) holding the cues themselves, in the order they were added;
///  - an ordered hash set (`indexmap::IndexSet`) holding the logical order of the array items;
///  - and an interval tree (`interavl::IntervalTree`) for looking up the cues active at a time.
///
/// Array entries are never moved. Removing a cue nulls its slot, so `CueIndex` values stay
/// valid lookup keys for the other two structures.
pub struct CueTrack {
    cues: Vec<Option<Cue>>,
    query_index: interavl::IntervalTree<Milliseconds, Leaf>,
    order: indexmap::IndexSet<CueIndex>,
    count: usize,
}

impl CueTrack {
    #[must_use]
    pub fn new_empty() -> Self {
        Self {
            cues: vec![],
            query_index: interavl::IntervalTree::default(),
            order: indexmap::IndexSet::default(),
            count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn get(&self, index: CueIndex) -> Option<&Cue> {
        self.cues.get(index.0).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn get_mut(&mut self, index: CueIndex) -> Option<&mut Cue> {
        self.cues.get_mut(index.0).and_then(Option::as_mut)
    }

    /// Add a cue to the end of the track.
    pub fn push(&mut self, cue: Cue) -> CueIndex {
        let new_index = CueIndex(self.cues.len());
        Self::query_index_insert(&mut self.query_index, time_range(&cue), new_index);
        self.cues.push(Some(cue));
        self.order.insert(new_index);
        self.count += 1;
        new_index
    }

    /// Remove a cue from the track, returning it if the index was valid.
    pub fn remove(&mut self, index: CueIndex) -> Option<Cue> {
        let cue = self.cues.get_mut(index.0)?.take()?;
        Self::query_index_remove(&mut self.query_index, time_range(&cue), index);
        self.order.shift_remove(&index);
        self.count -= 1;
        Some(cue)
    }

    /// Indices of all cues whose `[start, end)` interval contains `time` (in seconds), in the
    /// order the cues were added.
    #[must_use]
    pub fn active_at(&self, time: f64) -> Vec<CueIndex> {
        let point = Milliseconds::from_seconds(time);
        let stab = point..Milliseconds(point.0 + 1);

        let mut active: Vec<CueIndex> = self
            .query_index
            .iter_overlaps(&stab)
            .flat_map(|(_, leaf)| leaf.indices())
            .collect();
        active.sort_by_key(|index| self.order.get_index_of(index));
        active
    }

    /// Iterate over all cue indices in logical order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = CueIndex> {
        self.order.iter().copied()
    }

    /// Iterate over all cues in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &Cue> {
        self.order
            .iter()
            .filter_map(|index| self.cues[index.0].as_ref())
    }

    fn query_index_remove(
        query_index: &mut interavl::IntervalTree<Milliseconds, Leaf>,
        interval: Range<Milliseconds>,
        index: CueIndex,
    ) {
        if let Some(Leaf::Multiple(mut vec)) = query_index.remove(&interval) {
            // Put the other cues sharing this interval back
            vec.retain(|other| *other != index);
            if let [single] = vec.as_slice() {
                query_index.insert(interval, Leaf::Single(*single));
            } else if !vec.is_empty() {
                query_index.insert(interval, Leaf::Multiple(vec));
            }
        }
    }

    fn query_index_insert(
        query_index: &mut interavl::IntervalTree<Milliseconds, Leaf>,
        interval: Range<Milliseconds>,
        index: CueIndex,
    ) {
        if let Some(old) = query_index.insert(interval.clone(), Leaf::Single(index)) {
            query_index.insert(
                interval,
                match old {
                    Leaf::Single(old_index) => Leaf::Multiple(vec![old_index, index]),
                    Leaf::Multiple(mut vec) => {
                        vec.push(index);
                        Leaf::Multiple(vec)
                    }
                },
            );
        }
    }
}

/// Interval covered by a cue. Cues whose end is not after their start still occupy one
/// millisecond, so they can be found again on removal.
fn time_range(cue: &Cue) -> Range<Milliseconds> {
    let start = Milliseconds::from_seconds(cue.start_time);
    let end = Milliseconds::from_seconds(cue.end_time).max(Milliseconds(start.0 + 1));
    start..end
}

impl Default for CueTrack {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl Debug for CueTrack {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let trail_s = if self.count == 1 { "" } else { "s" };
        write!(formatter, "CueTrack with {} cue{trail_s}", self.count)
    }
}

impl FromIterator<Cue> for CueTrack {
    fn from_iter<T: IntoIterator<Item = Cue>>(iter: T) -> Self {
        let mut track = Self::new_empty();
        for cue in iter {
            track.push(cue);
        }
        track
    }
}

impl Index<CueIndex> for CueTrack {
    type Output = Cue;

    fn index(&self, index: CueIndex) -> &Self::Output {
        self.get(index).expect("cue index should refer to a cue in this track")
    }
}

impl IndexMut<CueIndex> for CueTrack {
    fn index_mut(&mut self, index: CueIndex) -> &mut Self::Output {
        self.get_mut(index)
            .expect("cue index should refer to a cue in this track")
    }
}

enum Leaf {
    Single(CueIndex),
    Multiple(Vec<CueIndex>),
}

impl Leaf {
    fn indices(&self) -> Vec<CueIndex> {
        match self {
            Leaf::Single(index) => vec![*index],
            Leaf::Multiple(vec) => vec.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, end: f64, text: &str) -> Cue {
        Cue::new(start, end, text)
    }

    #[test]
    fn track_modify() {
        let mut track: CueTrack = vec![cue(0.0, 1.0, "a"), cue(1.0, 2.0, "b")]
            .into_iter()
            .collect();
        assert!(!track.is_empty());
        assert_eq!(track.len(), 2);

        let c = track.push(cue(3.0, 4.0, "c"));
        assert_eq!(track[c].text(), "c");

        let first = track.iter_in_order().next().unwrap();
        let removed = track.remove(first).unwrap();
        assert_eq!(removed.text(), "a");
        assert!(track.remove(first).is_none());
        assert_eq!(track.len(), 2);

        let texts: Vec<&str> = track.iter().map(Cue::text).collect();
        assert_eq!(texts, ["b", "c"]);
    }

    #[test]
    fn track_query() {
        let mut track = CueTrack::new_empty();
        assert!(track.active_at(0.0).is_empty());

        let a = track.push(cue(1.0, 2.0, "a"));
        assert!(track.active_at(0.5).is_empty());
        assert_eq!(track.active_at(1.0), [a]);
        assert_eq!(track.active_at(1.999), [a]);
        assert!(track.active_at(2.0).is_empty());

        let b = track.push(cue(1.5, 3.0, "b"));
        let c = track.push(cue(1.5, 3.0, "c"));
        assert_eq!(track.active_at(1.6), [a, b, c]);
        assert_eq!(track.active_at(2.5), [b, c]);

        track.remove(b);
        assert_eq!(track.active_at(2.5), [c]);
        track.remove(c);
        assert!(track.active_at(2.5).is_empty());
    }

    #[test]
    fn backwards_cue_is_still_indexed() {
        let mut track = CueTrack::new_empty();
        let index = track.push(cue(5.0, 4.0, "backwards"));
        assert_eq!(track.active_at(5.0), [index]);
        assert!(track.remove(index).is_some());
        assert!(track.is_empty());
    }
}
