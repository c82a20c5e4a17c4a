//! The coupled page-table / voxel-cache pair.
//!
//! Both levels share one recycling discipline but evictions in either
//! level ripple into the other: losing a voxel block invalidates the
//! entry inside its owning page, and losing a page invalidates every
//! voxel block it mapped. `PageVoxelRegistry` performs that bookkeeping
//! and reports the net effect as a [`CacheDelta`].

use rustc_hash::FxHashMap;

use super::block_registry::{BlockRegistry, InfoSource};
use super::config::CacheConfig;
use super::coords::{PageBlockScale, VoxelBlockScale, WorldCoord};
use super::delta::{CacheDelta, MapState, PageTableDelta, VoxelCacheDelta};

/// Payload of a voxel-cache slot: which world block it holds and which
/// page block owns the page-table entry pointing at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelCacheInfo {
    pub page_block: WorldCoord<PageBlockScale>,
    pub voxel_block: WorldCoord<VoxelBlockScale>,
}

/// Payload of a page-table slot: the residency state of each voxel block
/// the page knows about. `NotMapped` blocks simply have no entry here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageTableInfo {
    pub mapped: FxHashMap<WorldCoord<VoxelBlockScale>, MapState>,
}

struct VoxelInfoSource {
    page_block: WorldCoord<PageBlockScale>,
    voxel_block: WorldCoord<VoxelBlockScale>,
}

impl InfoSource<VoxelCacheInfo> for VoxelInfoSource {
    fn fresh(&self) -> VoxelCacheInfo {
        VoxelCacheInfo { page_block: self.page_block, voxel_block: self.voxel_block }
    }

    fn merge(&self, existing: &mut VoxelCacheInfo) {
        *existing = self.fresh();
    }
}

struct PageInfoSource {
    voxel_block: WorldCoord<VoxelBlockScale>,
}

impl InfoSource<PageTableInfo> for PageInfoSource {
    fn fresh(&self) -> PageTableInfo {
        let mut info = PageTableInfo::default();
        info.mapped.insert(self.voxel_block, MapState::Mapped);
        info
    }

    fn merge(&self, existing: &mut PageTableInfo) {
        existing.mapped.insert(self.voxel_block, MapState::Mapped);
    }
}

/// Two bounded registries kept mutually consistent.
pub struct PageVoxelRegistry {
    voxel_cache: BlockRegistry<VoxelBlockScale, VoxelCacheInfo>,
    page_tables: BlockRegistry<PageBlockScale, PageTableInfo>,
}

impl PageVoxelRegistry {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            voxel_cache: BlockRegistry::new(config.voxel_cache_slots()),
            page_tables: BlockRegistry::new(config.page_table_slots()),
        }
    }

    pub fn voxel_cache(&self) -> &BlockRegistry<VoxelBlockScale, VoxelCacheInfo> {
        &self.voxel_cache
    }

    pub fn page_tables(&self) -> &BlockRegistry<PageBlockScale, PageTableInfo> {
        &self.page_tables
    }

    /// Register a voxel block under its owning page block.
    ///
    /// When the voxel block is already resident this only refreshes the
    /// recency of both levels and returns an empty delta. Otherwise slots
    /// are claimed in both levels, any evictions are unwound across the
    /// levels, and the resulting delta lists the removals before the two
    /// final `Mapped` additions.
    pub fn register_to_cache(
        &mut self,
        page_block: WorldCoord<PageBlockScale>,
        voxel_block: WorldCoord<VoxelBlockScale>,
    ) -> CacheDelta {
        if self.voxel_cache.find(voxel_block).is_some() {
            self.voxel_cache.touch(voxel_block);
            self.page_tables.touch(page_block);
            return CacheDelta::default();
        }

        let mut delta = CacheDelta::default();

        let evicted_voxel = self
            .voxel_cache
            .set(voxel_block, &VoxelInfoSource { page_block, voxel_block });
        let evicted_page = self
            .page_tables
            .set(page_block, &PageInfoSource { voxel_block });

        // A voxel block lost its slot: detach it from its owner page. The
        // owner may itself have just been evicted, in which case there is
        // nothing left to detach from.
        let voxel_slot = match &evicted_voxel {
            Some(old) => {
                let owner = old.info.page_block;
                let owner_len = self
                    .page_tables
                    .find(owner)
                    .map(|entry| entry.info.mapped.len());
                match owner_len {
                    Some(1) => {
                        let Some(removed) = self.page_tables.delete(owner) else {
                            unreachable!("owner page vanished between find and delete");
                        };
                        delta
                            .page_table
                            .push(PageTableDelta::page_removed(removed.slot, MapState::NotMapped));
                    }
                    Some(_) => {
                        let Some(entry) = self.page_tables.find_mut(owner) else {
                            unreachable!("owner page vanished between find and find_mut");
                        };
                        entry.info.mapped.remove(&old.info.voxel_block);
                        delta.page_table.push(PageTableDelta::block_unmapped(
                            entry.slot,
                            MapState::NotMapped,
                            old.info.voxel_block,
                        ));
                    }
                    None => {}
                }
                old.slot
            }
            None => {
                let Some(entry) = self.voxel_cache.find(voxel_block) else {
                    unreachable!("voxel block missing right after set");
                };
                entry.slot
            }
        };

        // A whole page lost its slot: every voxel block it still mapped
        // must leave the voxel cache too. Blocks already recycled above
        // (or tombstoned) are simply not there to delete.
        let page_slot = match evicted_page {
            Some(old) => {
                delta
                    .page_table
                    .push(PageTableDelta::page_removed(old.slot, MapState::NotMapped));
                for old_voxel in old.info.mapped.keys() {
                    if let Some(removed) = self.voxel_cache.delete(*old_voxel) {
                        delta
                            .voxel_cache
                            .push(VoxelCacheDelta::block_removed(removed.slot, MapState::NotMapped));
                    }
                }
                old.slot
            }
            None => {
                let Some(entry) = self.page_tables.find(page_block) else {
                    unreachable!("page block missing right after set");
                };
                entry.slot
            }
        };

        delta
            .voxel_cache
            .push(VoxelCacheDelta::block_mapped(voxel_slot, voxel_block));
        delta
            .page_table
            .push(PageTableDelta::block_mapped(page_slot, voxel_slot, voxel_block));
        delta
    }

    /// Tombstone an entire page block, dropping any of its voxel blocks
    /// from the voxel cache. Only updates an existing page-table entry; a
    /// non-resident page yields an empty delta.
    pub fn mark_empty_page_block(
        &mut self,
        page_block: WorldCoord<PageBlockScale>,
    ) -> CacheDelta {
        let Some(removed_page) = self.page_tables.delete(page_block) else {
            return CacheDelta::default();
        };

        let mut delta = CacheDelta::default();
        delta
            .page_table
            .push(PageTableDelta::page_removed(removed_page.slot, MapState::Empty));

        for voxel_block in removed_page.info.mapped.keys() {
            if let Some(removed) = self.voxel_cache.delete(*voxel_block) {
                delta
                    .voxel_cache
                    .push(VoxelCacheDelta::block_removed(removed.slot, MapState::Empty));
            }
        }
        delta
    }

    /// Tombstone a single voxel block inside a resident page. The page
    /// entry is updated in place without touching recency; a non-resident
    /// page yields an empty delta.
    pub fn mark_empty_voxel_block(
        &mut self,
        page_block: WorldCoord<PageBlockScale>,
        voxel_block: WorldCoord<VoxelBlockScale>,
    ) -> CacheDelta {
        let Some(entry) = self.page_tables.find_mut(page_block) else {
            log::debug!("mark_empty_voxel_block on non-resident page {:?}", page_block);
            return CacheDelta::default();
        };

        let mut delta = CacheDelta::default();
        entry.info.mapped.insert(voxel_block, MapState::Empty);
        delta.page_table.push(PageTableDelta::block_unmapped(
            entry.slot,
            MapState::Empty,
            voxel_block,
        ));

        if let Some(removed) = self.voxel_cache.delete(voxel_block) {
            delta
                .voxel_cache
                .push(VoxelCacheDelta::block_removed(removed.slot, MapState::Empty));
        }
        delta
    }

    /// True when the page is resident and records the voxel block as a
    /// tombstone. Absence of the page or of the entry reads as false: an
    /// unknown block is not the same as a known-empty one.
    pub fn is_empty_voxel_block(
        &self,
        page_block: WorldCoord<PageBlockScale>,
        voxel_block: WorldCoord<VoxelBlockScale>,
    ) -> bool {
        self.page_tables
            .find(page_block)
            .and_then(|entry| entry.info.mapped.get(&voxel_block))
            .map_or(false, |state| *state == MapState::Empty)
    }
}
