//! Top-level cache facade.
//!
//! Ties the page directory's permanent tombstones to the bounded
//! page-table / voxel-cache pair and exposes the two entry points callers
//! actually drive: `access` on every sampled block and the `mark_empty_*`
//! calls once a fetch comes back with no data.

use super::config::CacheConfig;
use super::coords::{PageBlockScale, VoxelBlockScale, VoxelScale, WorldCoord};
use super::delta::CacheDelta;
use super::page_directory::PageDirectoryRegistry;
use super::page_voxel::PageVoxelRegistry;

pub struct CacheRegistry {
    config: CacheConfig,
    page_voxel: PageVoxelRegistry,
    page_directory: PageDirectoryRegistry,
}

impl CacheRegistry {
    pub fn new(config: CacheConfig) -> Self {
        let page_voxel = PageVoxelRegistry::new(&config);
        let page_directory = PageDirectoryRegistry::new(&config);
        Self { config, page_voxel, page_directory }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn page_voxel(&self) -> &PageVoxelRegistry {
        &self.page_voxel
    }

    pub fn page_directory(&self) -> &PageDirectoryRegistry {
        &self.page_directory
    }

    /// Make a voxel block resident, registering it if needed.
    ///
    /// Blocks known to be empty at either granularity are skipped outright
    /// so tombstoned space never consumes cache slots or fetches.
    pub fn access(
        &mut self,
        page_block: WorldCoord<PageBlockScale>,
        voxel_block: WorldCoord<VoxelBlockScale>,
    ) -> CacheDelta {
        if self.page_directory.is_empty(page_block)
            || self.page_voxel.is_empty_voxel_block(page_block, voxel_block)
        {
            return CacheDelta::default();
        }
        self.page_voxel.register_to_cache(page_block, voxel_block)
    }

    /// [`access`](Self::access) addressed by a raw dataset voxel
    /// coordinate; both block coordinates are derived by shifting.
    pub fn access_voxel(&mut self, voxel: WorldCoord<VoxelScale>) -> CacheDelta {
        let page_block = self.config.to_page_block(voxel);
        let voxel_block = self.config.to_voxel_block(voxel);
        self.access(page_block, voxel_block)
    }

    /// Tombstone a whole page block everywhere: cache levels first, then
    /// the directory record, appended after the removals.
    pub fn mark_empty_page_block(
        &mut self,
        page_block: WorldCoord<PageBlockScale>,
    ) -> CacheDelta {
        let mut delta = self.page_voxel.mark_empty_page_block(page_block);
        delta.merge(self.page_directory.mark_empty(page_block));
        delta
    }

    /// Tombstone a single voxel block within a resident page.
    pub fn mark_empty_voxel_block(
        &mut self,
        page_block: WorldCoord<PageBlockScale>,
        voxel_block: WorldCoord<VoxelBlockScale>,
    ) -> CacheDelta {
        self.page_voxel.mark_empty_voxel_block(page_block, voxel_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::coords::Size3;
    use crate::paging::delta::MapState;

    fn registry() -> CacheRegistry {
        let config = CacheConfig::new(
            Size3::splat(4),
            Size3::splat(8),
            Size3::splat(2),
            Size3::splat(4),
            Size3::splat(64),
        )
        .expect("valid test config");
        CacheRegistry::new(config)
    }

    fn page(v: u32) -> WorldCoord<PageBlockScale> {
        WorldCoord::splat(v)
    }

    fn voxel(v: u32) -> WorldCoord<VoxelBlockScale> {
        WorldCoord::splat(v)
    }

    #[test]
    fn access_registers_then_short_circuits() {
        let mut reg = registry();
        let first = reg.access(page(0), voxel(0));
        assert_eq!(first.voxel_cache.len(), 1);
        assert_eq!(first.page_table.len(), 1);

        let second = reg.access(page(0), voxel(0));
        assert!(second.is_empty());
    }

    #[test]
    fn access_voxel_translates_by_shifting() {
        let mut reg = registry();
        let delta = reg.access_voxel(WorldCoord::new(13, 0, 0));

        // Voxel 13 lives in voxel block (3,0,0) inside page block (1,0,0).
        assert_eq!(delta.voxel_cache[0].entry, Some(WorldCoord::new(3, 0, 0)));
        assert_eq!(delta.page_table[0].location, Some(WorldCoord::new(3, 0, 0)));

        // Any other voxel of the same block is a hit.
        assert!(reg.access_voxel(WorldCoord::new(15, 3, 3)).is_empty());
    }

    #[test]
    fn directory_tombstone_short_circuits_access() {
        let mut reg = registry();
        reg.mark_empty_page_block(page(1));

        assert!(reg.access(page(1), voxel(4)).is_empty());
        assert_eq!(reg.page_voxel().voxel_cache().registered_blocks(), 0);
    }

    #[test]
    fn voxel_tombstone_short_circuits_access() {
        let mut reg = registry();
        reg.access(page(0), voxel(0));
        reg.mark_empty_voxel_block(page(0), voxel(1));

        assert!(reg.access(page(0), voxel(1)).is_empty());
        // Only the tombstone blocks; its siblings stay resident and other
        // blocks still register.
        assert!(!reg.page_voxel().is_empty_voxel_block(page(0), voxel(0)));
        assert_eq!(reg.access(page(2), voxel(2)).voxel_cache.len(), 1);
    }

    #[test]
    fn mark_empty_page_block_merges_directory_record_last() {
        let mut reg = registry();
        reg.access(page(0), voxel(0));
        reg.access(page(0), voxel(1));

        let delta = reg.mark_empty_page_block(page(0));

        assert_eq!(delta.page_table.len(), 1);
        assert_eq!(delta.page_table[0].state, MapState::Empty);
        assert_eq!(delta.voxel_cache.len(), 2);
        assert_eq!(delta.page_directory.len(), 1);
        assert_eq!(delta.page_directory[0].page_block, page(0));
        assert!(reg.page_directory().is_empty(page(0)));
    }

    #[test]
    fn mark_empty_page_block_on_cold_page_still_records_tombstone() {
        let mut reg = registry();
        let delta = reg.mark_empty_page_block(page(5));

        assert!(delta.page_table.is_empty());
        assert!(delta.voxel_cache.is_empty());
        assert_eq!(delta.page_directory.len(), 1);
        assert!(reg.access(page(5), voxel(20)).is_empty());
    }

    #[test]
    fn tombstones_survive_cache_churn() {
        let mut reg = registry();
        reg.mark_empty_page_block(page(7));

        // Page table capacity is 8; push enough distinct pages through to
        // recycle every slot a few times.
        for v in 0..32 {
            reg.access(page(v % 7), voxel(v));
        }
        assert!(reg.access(page(7), voxel(28)).is_empty());
    }
}
