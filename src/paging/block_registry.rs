//! Fixed-capacity slot allocator over the LRU substrate.
//!
//! A `BlockRegistry` hands out physical cache slots to sparse world block
//! coordinates. Construction fills a free list with every slot in the
//! cache; once the free list drains, further insertions recycle the
//! least-recently-used slot and hand the evicted entry back to the caller
//! as an owned snapshot.

use super::coords::{Scale, Size3, SlotCoord, WorldCoord};
use super::lru::LruMap;

/// A physical slot bound to its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheEntry<S: Scale, I> {
    pub slot: SlotCoord<S>,
    pub info: I,
}

/// Builds the payload for a slot being (re)assigned to a world block.
///
/// `fresh` runs when a world block first claims a slot; `merge` runs when
/// the block is already resident and its payload must absorb the new
/// registration. The two cache levels provide one implementation each, so
/// there are no payload closures smuggling capture state around.
pub trait InfoSource<I> {
    fn fresh(&self) -> I;
    fn merge(&self, existing: &mut I);
}

/// Maps sparse world block coordinates onto a bounded set of cache slots,
/// evicting least-recently-used mappings when full.
pub struct BlockRegistry<S: Scale, I> {
    size: Size3<S>,
    free: Vec<SlotCoord<S>>,
    lru: LruMap<WorldCoord<S>, CacheEntry<S, I>>,
}

impl<S: Scale, I> BlockRegistry<S, I> {
    /// Create a registry with one slot per cell of `size`.
    pub fn new(size: Size3<S>) -> Self {
        let mut free = Vec::with_capacity(size.volume());
        for x in 0..size.x {
            for y in 0..size.y {
                for z in 0..size.z {
                    free.push(SlotCoord::new(x, y, z));
                }
            }
        }
        Self { size, free, lru: LruMap::new() }
    }

    pub fn size(&self) -> Size3<S> {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.size.volume()
    }

    pub fn free_slots(&self) -> usize {
        self.free.len()
    }

    pub fn registered_blocks(&self) -> usize {
        self.lru.len()
    }

    /// Look up a resident block, marking it most recently used.
    pub fn get(&mut self, world: WorldCoord<S>) -> Option<&CacheEntry<S, I>> {
        self.lru.get(&world)
    }

    /// Look up a resident block without touching recency.
    pub fn find(&self, world: WorldCoord<S>) -> Option<&CacheEntry<S, I>> {
        self.lru.find(&world)
    }

    /// Mutable lookup without touching recency.
    pub fn find_mut(&mut self, world: WorldCoord<S>) -> Option<&mut CacheEntry<S, I>> {
        self.lru.find_mut(&world)
    }

    /// Mark a resident block most recently used; silently does nothing
    /// when the block is not resident.
    pub fn touch(&mut self, world: WorldCoord<S>) {
        let _ = self.lru.get(&world);
    }

    /// Register `world`, allocating or recycling a slot as needed.
    ///
    /// Resident: the payload absorbs the registration via
    /// [`InfoSource::merge`] and recency is touched. Free slot available:
    /// it is claimed with a fresh payload. Full: the least-recently-used
    /// entry is evicted, its slot reassigned, and the evicted entry
    /// returned by value so the caller can unwind references to it. The
    /// snapshot stays valid however the slot is reused afterwards.
    pub fn set(&mut self, world: WorldCoord<S>, source: &impl InfoSource<I>) -> Option<CacheEntry<S, I>> {
        if let Some(entry) = self.lru.get_mut(&world) {
            source.merge(&mut entry.info);
            return None;
        }

        if let Some(slot) = self.free.pop() {
            self.lru.insert(world, CacheEntry { slot, info: source.fresh() });
            return None;
        }

        // Free list empty implies the LRU holds every slot; with nonzero
        // capacity the shift cannot fail.
        let Some((evicted_world, evicted)) = self.lru.shift() else {
            unreachable!("free list and LRU both empty in a nonzero-capacity registry");
        };
        log::trace!(
            "evicting {:?} to reuse slot {:?} for {:?}",
            evicted_world,
            evicted.slot,
            world
        );
        self.lru
            .insert(world, CacheEntry { slot: evicted.slot, info: source.fresh() });
        Some(evicted)
    }

    /// Remove a mapping, returning its slot to the free list.
    pub fn delete(&mut self, world: WorldCoord<S>) -> Option<CacheEntry<S, I>> {
        let entry = self.lru.remove(&world)?;
        self.free.push(entry.slot);
        Some(entry)
    }

    /// Iterate resident (world, entry) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&WorldCoord<S>, &CacheEntry<S, I>)> {
        self.lru.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::coords::VoxelBlockScale;

    struct Fixed(u32);

    impl InfoSource<u32> for Fixed {
        fn fresh(&self) -> u32 {
            self.0
        }
        fn merge(&self, existing: &mut u32) {
            *existing = self.0;
        }
    }

    fn registry(extent: u32) -> BlockRegistry<VoxelBlockScale, u32> {
        BlockRegistry::new(Size3::splat(extent))
    }

    fn world(v: u32) -> WorldCoord<VoxelBlockScale> {
        WorldCoord::splat(v)
    }

    #[test]
    fn free_list_covers_whole_slot_space() {
        let reg = registry(2);
        assert_eq!(reg.free_slots(), 8);
        assert_eq!(reg.registered_blocks(), 0);
        assert_eq!(reg.capacity(), 8);
    }

    #[test]
    fn set_consumes_free_slots_before_evicting() {
        let mut reg = registry(2);
        for v in 0..8 {
            assert!(reg.set(world(v), &Fixed(v)).is_none());
        }
        assert_eq!(reg.free_slots(), 0);
        assert_eq!(reg.registered_blocks(), 8);
    }

    #[test]
    fn set_full_evicts_least_recently_used() {
        let mut reg = registry(1);
        assert!(reg.set(world(0), &Fixed(0)).is_none());

        let evicted = reg.set(world(1), &Fixed(1)).expect("must evict");
        assert_eq!(evicted.info, 0);
        assert!(reg.find(world(0)).is_none());
        assert_eq!(reg.find(world(1)).map(|e| e.info), Some(1));
        // The evicted snapshot kept the slot that was reused.
        assert_eq!(reg.find(world(1)).map(|e| e.slot), Some(evicted.slot));
    }

    #[test]
    fn set_resident_merges_without_eviction() {
        let mut reg = registry(1);
        reg.set(world(0), &Fixed(1));
        assert!(reg.set(world(0), &Fixed(2)).is_none());
        assert_eq!(reg.find(world(0)).map(|e| e.info), Some(2));
        assert_eq!(reg.registered_blocks(), 1);
    }

    #[test]
    fn get_protects_from_eviction() {
        let mut reg = registry(2);
        // Capacity 8; fill it, then touch the oldest.
        for v in 0..8 {
            reg.set(world(v), &Fixed(v));
        }
        assert!(reg.get(world(0)).is_some());

        let evicted = reg.set(world(100), &Fixed(100)).expect("full cache must evict");
        // world(1) was the oldest untouched entry.
        assert_eq!(evicted.info, 1);
        assert!(reg.find(world(0)).is_some());
    }

    #[test]
    fn find_does_not_protect_from_eviction() {
        let mut reg = registry(1);
        reg.set(world(0), &Fixed(0));
        assert!(reg.find(world(0)).is_some());

        let evicted = reg.set(world(1), &Fixed(1)).expect("must evict");
        assert_eq!(evicted.info, 0);
    }

    #[test]
    fn delete_returns_slot_to_free_list() {
        let mut reg = registry(1);
        reg.set(world(0), &Fixed(0));
        assert_eq!(reg.free_slots(), 0);

        let removed = reg.delete(world(0)).expect("was resident");
        assert_eq!(removed.info, 0);
        assert_eq!(reg.free_slots(), 1);
        assert_eq!(reg.registered_blocks(), 0);
        assert!(reg.delete(world(0)).is_none());
    }

    #[test]
    fn touch_on_absent_key_is_a_no_op() {
        let mut reg = registry(1);
        reg.touch(world(5));
        assert_eq!(reg.registered_blocks(), 0);
        assert_eq!(reg.free_slots(), 1);
    }

    #[test]
    fn capacity_is_conserved_through_churn() {
        let mut reg = registry(2);
        for v in 0..50 {
            reg.set(world(v), &Fixed(v));
            assert_eq!(reg.free_slots() + reg.registered_blocks(), reg.capacity());
        }
        for v in 40..50 {
            reg.delete(world(v));
            assert_eq!(reg.free_slots() + reg.registered_blocks(), reg.capacity());
        }
    }

    #[test]
    fn resident_slots_stay_bijective() {
        let mut reg = registry(2);
        for v in 0..100 {
            reg.set(world(v), &Fixed(v));

            let mut slots: Vec<_> = reg.iter().map(|(_, e)| e.slot).collect();
            let total = slots.len();
            slots.sort_by_key(|s| (s.x, s.y, s.z));
            slots.dedup();
            assert_eq!(slots.len(), total, "two world keys share a slot");
        }
    }
}
