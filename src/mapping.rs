//! Scene → snapshot mapping lookup.

use std::collections::HashMap;
use std::fmt;

/// Highest snapshot slot on the X Air mixers.
pub const MAX_SNAPSHOT: u32 = 64;

/// A validated snapshot slot number, 1-based as shown on the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotIndex(u32);

impl SnapshotIndex {
    /// Returns `None` unless `value` is within 1-64.
    pub fn new(value: u32) -> Option<Self> {
        (1..=MAX_SNAPSHOT).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The zero-based index the wire protocol expects.
    pub fn wire_index(self) -> i32 {
        self.0 as i32 - 1
    }
}

impl fmt::Display for SnapshotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scene-name → snapshot-slot table.
///
/// Keys are case-sensitive scene names. A stored value of 0 means the row
/// exists but has no snapshot assigned. Values above [`MAX_SNAPSHOT`] are
/// rejected at insertion so nothing invalid can reach the send path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSnapshotMap {
    entries: HashMap<String, u32>,
}

impl SceneSnapshotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry. Returns `false` (storing nothing) when
    /// `snapshot` is above [`MAX_SNAPSHOT`]; 0 is accepted as "unassigned".
    pub fn insert(&mut self, scene: impl Into<String>, snapshot: u32) -> bool {
        if snapshot > MAX_SNAPSHOT {
            return false;
        }
        self.entries.insert(scene.into(), snapshot);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the snapshot to recall when `scene` becomes active.
    ///
    /// A disabled bridge, an unknown scene and an unassigned (0) slot all
    /// resolve to `None`. None of these are errors - they are the normal
    /// "do nothing" path.
    pub fn resolve(&self, scene: &str, enabled: bool) -> Option<SnapshotIndex> {
        if !enabled {
            return None;
        }
        self.entries.get(scene).copied().and_then(SnapshotIndex::new)
    }
}
