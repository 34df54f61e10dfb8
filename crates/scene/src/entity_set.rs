use crate::entity::EntityId;
use foundation::handles::Handle;

/// Set of entity ids backed by a bitset over `EntityId::index()`.
///
/// Iteration yields indices in ascending order.
#[derive(Debug, Clone, Default)]
pub struct EntitySet {
    words: Vec<u64>,
    len: usize,
}

impl EntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_index(max_index_inclusive: u32) -> Self {
        let mut s = Self::default();
        s.ensure_capacity(max_index_inclusive);
        s
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        let (word, bit) = word_bit(entity.index());
        self.words
            .get(word)
            .is_some_and(|w| (w & (1u64 << bit)) != 0)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, entity: EntityId) -> bool {
        let index = entity.index();
        self.ensure_capacity(index);
        let (word, bit) = word_bit(index);
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        self.len += 1;
        true
    }

    pub fn iter_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let base = (wi as u32) * 64;
            (0..64u32)
                .filter(move |bit| (w & (1u64 << bit)) != 0)
                .map(move |bit| base + bit)
        })
    }

    /// Generation-0 ids, matching how `OverlayDataset` assigns them.
    pub fn iter_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter_indices().map(|idx| EntityId(Handle::new(idx, 0)))
    }

    fn ensure_capacity(&mut self, index: u32) {
        let (word, _bit) = word_bit(index);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
    }
}

impl PartialEq for EntitySet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter_indices().eq(other.iter_indices())
    }
}

impl Eq for EntitySet {}

fn word_bit(index: u32) -> (usize, u32) {
    ((index / 64) as usize, index % 64)
}
