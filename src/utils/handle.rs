use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

const ID_BITS: u32 = 20;
const GENERATION_BITS: u32 = 32 - ID_BITS;
const ID_MASK: u32 = (1 << ID_BITS) - 1;

/// Reserved id marking a handle that refers to nothing.
pub const INVALID_ID: u32 = ID_MASK;
/// Largest id a pool will hand out.
pub const MAX_ID: u32 = INVALID_ID - 1;
/// Largest generation a slot can reach before it is retired.
pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

/// Generational reference into a [`SlotPool`].
///
/// A handle is a plain lookup key: copying or dropping it has no effect on the
/// resource it names. `T` is a tag type that keeps buffer and texture handles
/// apart at compile time.
pub struct Handle<T> {
    raw: u32,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn new(id: u32, generation: u32) -> Self {
        debug_assert!(id <= INVALID_ID, "handle id {id} does not fit in {ID_BITS} bits");
        debug_assert!(generation <= MAX_GENERATION);
        Self::from_raw((generation << ID_BITS) | (id & ID_MASK))
    }

    pub fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            phantom: PhantomData,
        }
    }

    pub fn raw(&self) -> u32 {
        self.raw
    }

    pub fn id(&self) -> u32 {
        self.raw & ID_MASK
    }

    pub fn generation(&self) -> u32 {
        self.raw >> ID_BITS
    }

    /// Only says whether the handle was ever issued; a valid handle may still
    /// be stale for the pool it came from.
    pub fn is_valid(&self) -> bool {
        self.id() != INVALID_ID
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::new(INVALID_ID, 0)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Handle({}:{})", self.id(), self.generation())
        } else {
            write!(f, "Handle(invalid)")
        }
    }
}

struct Slot<P> {
    generation: u32,
    payload: Option<P>,
}

/// Arena of resources addressed by [`Handle`].
///
/// Freed slots go on a free list and come back with a bumped generation, so a
/// handle to a destroyed resource never resolves again. A slot whose
/// generation hits [`MAX_GENERATION`] is retired instead of reused.
pub struct SlotPool<V, P> {
    slots: Vec<Slot<P>>,
    empty: Vec<u32>,
    len: usize,
    phantom: PhantomData<fn() -> V>,
}

impl<V, P> Default for SlotPool<V, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, P> SlotPool<V, P> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            empty: Vec::new(),
            len: 0,
            phantom: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            empty: Vec::with_capacity(capacity),
            len: 0,
            phantom: PhantomData,
        }
    }

    /// Stores `payload` and returns its handle, or an invalid handle when all
    /// [`MAX_ID`] slots are taken.
    pub fn insert(&mut self, payload: P) -> Handle<V> {
        let slot = match self.empty.pop() {
            Some(slot) => slot,
            None => {
                if self.slots.len() as u32 > MAX_ID {
                    log::error!("slot pool is full ({} slots)", self.slots.len());
                    return Handle::default();
                }
                self.slots.push(Slot {
                    generation: 0,
                    payload: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let entry = &mut self.slots[slot as usize];
        debug_assert!(entry.payload.is_none());
        entry.payload = Some(payload);
        self.len += 1;

        Handle::new(slot, entry.generation)
    }

    fn slot_index(&self, handle: Handle<V>) -> Option<usize> {
        if !handle.is_valid() {
            return None;
        }
        let index = handle.id() as usize;
        let slot = self.slots.get(index)?;
        if slot.generation == handle.generation() && slot.payload.is_some() {
            Some(index)
        } else {
            None
        }
    }

    pub fn get(&self, handle: Handle<V>) -> Option<&P> {
        let index = self.slot_index(handle)?;
        self.slots[index].payload.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle<V>) -> Option<&mut P> {
        let index = self.slot_index(handle)?;
        self.slots[index].payload.as_mut()
    }

    pub fn contains(&self, handle: Handle<V>) -> bool {
        self.slot_index(handle).is_some()
    }

    /// Takes the payload out and frees the slot. Stale handles are ignored.
    pub fn remove(&mut self, handle: Handle<V>) -> Option<P> {
        let index = self.slot_index(handle)?;
        let slot = &mut self.slots[index];
        let payload = slot.payload.take();
        self.len -= 1;

        slot.generation += 1;
        if slot.generation < MAX_GENERATION {
            self.empty.push(index as u32);
        } else {
            log::debug!("retiring slot {index} after {} generations", slot.generation);
        }

        payload
    }

    /// Drops the payload in place. Stale handles are ignored.
    pub fn erase(&mut self, handle: Handle<V>) {
        drop(self.remove(handle));
    }

    /// Number of live payloads.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever created, live, free or retired.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<V>, &P)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.payload
                .as_ref()
                .map(|payload| (Handle::new(index as u32, slot.generation), payload))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag;

    #[test]
    fn default_handle_is_invalid() {
        let handle = Handle::<Tag>::default();
        assert!(!handle.is_valid());
        assert_eq!(handle.id(), INVALID_ID);
        assert_eq!(format!("{:?}", handle), "Handle(invalid)");
    }

    #[test]
    fn handle_packs_id_and_generation() {
        let handle = Handle::<Tag>::new(1234, 56);
        assert_eq!(handle.id(), 1234);
        assert_eq!(handle.generation(), 56);
        assert_eq!(Handle::<Tag>::from_raw(handle.raw()), handle);
        assert_ne!(handle, Handle::new(1234, 57));
        assert_ne!(handle, Handle::new(1235, 56));
    }

    #[test]
    fn insert_and_get() {
        let mut pool = SlotPool::<Tag, u32>::new();
        let a = pool.insert(42);
        let b = pool.insert(7);
        assert!(a.is_valid());
        assert_ne!(a, b);
        assert_eq!(pool.get(a), Some(&42));
        assert_eq!(pool.get(b), Some(&7));
        assert_eq!(pool.len(), 2);

        *pool.get_mut(b).unwrap() = 8;
        assert_eq!(pool.get(b), Some(&8));
    }

    #[test]
    fn removed_handle_is_stale() {
        let mut pool = SlotPool::<Tag, &str>::new();
        let handle = pool.insert("a");
        assert_eq!(pool.remove(handle), Some("a"));
        assert!(pool.get(handle).is_none());
        assert!(pool.remove(handle).is_none());
        pool.erase(handle);
        assert!(pool.is_empty());
    }

    #[test]
    fn invalid_and_out_of_range_handles_resolve_to_nothing() {
        let mut pool = SlotPool::<Tag, u32>::new();
        pool.insert(1);
        assert!(pool.get(Handle::default()).is_none());
        assert!(pool.get(Handle::new(99, 0)).is_none());
        pool.erase(Handle::new(99, 0));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn reused_slot_gets_new_generation() {
        let mut pool = SlotPool::<Tag, u32>::new();
        let mut seen = Vec::new();
        for i in 0..8 {
            let handle = pool.insert(i);
            assert_eq!(handle.id(), 0);
            seen.push(handle);
            pool.erase(handle);
        }
        let current = pool.insert(100);
        for (i, old) in seen.iter().enumerate() {
            assert_eq!(old.generation(), i as u32);
            assert!(pool.get(*old).is_none());
        }
        assert_eq!(pool.get(current), Some(&100));
        assert_eq!(pool.slot_count(), 1);
    }

    #[test]
    fn exhausted_slot_is_retired() {
        let mut pool = SlotPool::<Tag, u32>::new();
        let mut last = Handle::default();
        for _ in 0..MAX_GENERATION {
            last = pool.insert(0);
            assert_eq!(last.id(), 0);
            pool.erase(last);
        }
        assert_eq!(last.generation(), MAX_GENERATION - 1);

        let fresh = pool.insert(1);
        assert_eq!(fresh.id(), 1);
        assert_eq!(fresh.generation(), 0);
        assert!(pool.get(last).is_none());
        assert_eq!(pool.slot_count(), 2);
    }

    #[test]
    fn full_pool_refuses_inserts() {
        let slots = MAX_ID as usize + 1;
        let mut pool = SlotPool::<Tag, ()>::with_capacity(slots);
        let mut last = Handle::default();
        for _ in 0..slots {
            last = pool.insert(());
        }
        assert_eq!(last.id(), MAX_ID);
        assert_eq!(pool.slot_count(), slots);

        let refused = pool.insert(());
        assert!(!refused.is_valid());
        assert_eq!(pool.len(), slots);

        pool.erase(last);
        let reused = pool.insert(());
        assert!(reused.is_valid());
        assert_eq!(reused.id(), MAX_ID);
        assert_eq!(reused.generation(), 1);
    }

    #[test]
    fn iter_visits_live_entries() {
        let mut pool = SlotPool::<Tag, u32>::new();
        let a = pool.insert(1);
        let b = pool.insert(2);
        let c = pool.insert(3);
        pool.erase(b);

        let live: Vec<_> = pool.iter().collect();
        assert_eq!(live, vec![(a, &1), (c, &3)]);
    }
}
