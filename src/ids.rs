/// Player identifier, index-based for efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PlayerId(pub u8);

/// Identifier of one card object for the lifetime of a match.
///
/// A card keeps its id across zone changes; the zone it currently sits in is
/// tracked by the [`GameState`](crate::GameState) containers, not by the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ObjectId(pub u64);

/// Card definition identifier, references a card database record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CardId(pub String);

impl PlayerId {
    /// Create a player ID from a seat index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ObjectId {
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-match allocator for object ids and effect timestamps.
///
/// Owned by the game state so two matches never share a counter and replays
/// with the same inputs produce the same ids.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_object: u64,
    next_timestamp: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        // 0 is reserved
        Self {
            next_object: 1,
            next_timestamp: 1,
        }
    }

    pub fn next_object_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        id
    }

    /// Monotonic timestamp used to order permanents and continuous effects.
    pub fn next_timestamp(&mut self) -> u64 {
        let ts = self.next_timestamp;
        self.next_timestamp += 1;
        ts
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_index_round_trip() {
        let p = PlayerId::from_index(3);
        assert_eq!(p.index(), 3);
        assert_eq!(p.to_string(), "P3");
    }

    #[test]
    fn test_allocator_is_monotonic_and_skips_zero() {
        let mut ids = IdAllocator::new();
        let a = ids.next_object_id();
        let b = ids.next_object_id();
        assert_eq!(a, ObjectId(1));
        assert!(b > a);

        let t1 = ids.next_timestamp();
        let t2 = ids.next_timestamp();
        assert!(t2 > t1);
    }

    #[test]
    fn test_allocators_are_independent() {
        let mut first = IdAllocator::new();
        let mut second = IdAllocator::new();
        first.next_object_id();
        first.next_object_id();
        assert_eq!(second.next_object_id(), ObjectId(1));
    }
}
