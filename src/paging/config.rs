//! Cache geometry and address translation.
//!
//! All sizes are fixed at construction. Translation from dataset voxel
//! coordinates to block coordinates is pure per-axis bit shifting, which
//! is why every extent must be a power of two; the constructor enforces
//! that instead of leaving it as an unchecked precondition.

use crate::error::{PagingError, PagingResult};

use super::coords::{
    PageBlockScale, PageDirectoryScale, Size3, VoxelBlockScale, VoxelScale, WorldCoord,
};

/// Fixed cache geometry shared by every registry.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    page_table_size: Size3<PageBlockScale>,
    voxel_cache_size: Size3<VoxelBlockScale>,
    page_block_size: Size3<PageBlockScale>,
    voxel_block_size: Size3<VoxelBlockScale>,
    dataset_size: Size3<VoxelScale>,
    /// log2 of the voxel block size per axis.
    voxel_block_shift: [u32; 3],
    /// log2 of voxel block size * page block size per axis; shifts a voxel
    /// coordinate straight to page-block granularity.
    page_shift: [u32; 3],
}

fn check_power_of_two<S: super::coords::Scale>(
    what: &'static str,
    size: Size3<S>,
) -> PagingResult<()> {
    if size.x == 0 || size.y == 0 || size.z == 0 {
        return Err(PagingError::ZeroExtent { what, size: size.as_tuple() });
    }
    if !size.is_power_of_two() {
        return Err(PagingError::NotPowerOfTwo { what, size: size.as_tuple() });
    }
    Ok(())
}

impl CacheConfig {
    /// Validate and freeze the cache geometry.
    ///
    /// `page_table_size` and `voxel_cache_size` are the texture extents of
    /// the two on-device caches in voxels of their own granularity;
    /// dividing by the corresponding block size yields the slot capacity.
    pub fn new(
        page_table_size: Size3<PageBlockScale>,
        voxel_cache_size: Size3<VoxelBlockScale>,
        page_block_size: Size3<PageBlockScale>,
        voxel_block_size: Size3<VoxelBlockScale>,
        dataset_size: Size3<VoxelScale>,
    ) -> PagingResult<Self> {
        check_power_of_two("page table size", page_table_size)?;
        check_power_of_two("voxel cache size", voxel_cache_size)?;
        check_power_of_two("page block size", page_block_size)?;
        check_power_of_two("voxel block size", voxel_block_size)?;
        check_power_of_two("dataset size", dataset_size)?;

        if !voxel_cache_size.is_divisible_by(voxel_block_size) {
            return Err(PagingError::NotDivisible {
                what: "voxel cache size",
                size: voxel_cache_size.as_tuple(),
                block: voxel_block_size.as_tuple(),
            });
        }
        if !page_table_size.is_divisible_by(page_block_size) {
            return Err(PagingError::NotDivisible {
                what: "page table size",
                size: page_table_size.as_tuple(),
                block: page_block_size.as_tuple(),
            });
        }

        let voxel_block_shift = voxel_block_size.log2();
        let page_block_shift = page_block_size.log2();
        let page_shift = [
            voxel_block_shift[0] + page_block_shift[0],
            voxel_block_shift[1] + page_block_shift[1],
            voxel_block_shift[2] + page_block_shift[2],
        ];

        Ok(Self {
            page_table_size,
            voxel_cache_size,
            page_block_size,
            voxel_block_size,
            dataset_size,
            voxel_block_shift,
            page_shift,
        })
    }

    /// Voxel coordinate to the voxel block containing it.
    pub fn to_voxel_block(&self, voxel: WorldCoord<VoxelScale>) -> WorldCoord<VoxelBlockScale> {
        voxel.shr(self.voxel_block_shift).retag()
    }

    /// Voxel coordinate straight to the page block containing it.
    pub fn to_page_block(&self, voxel: WorldCoord<VoxelScale>) -> WorldCoord<PageBlockScale> {
        voxel.shr(self.page_shift).retag()
    }

    /// Voxel cache capacity in slots.
    pub fn voxel_cache_slots(&self) -> Size3<VoxelBlockScale> {
        self.voxel_cache_size.component_div(self.voxel_block_size)
    }

    /// Page table capacity in slots.
    pub fn page_table_slots(&self) -> Size3<PageBlockScale> {
        self.page_table_size.component_div(self.page_block_size)
    }

    /// Dataset extent in page blocks, the page directory's address space.
    pub fn page_directory_extent(&self) -> Size3<PageDirectoryScale> {
        let block_voxels = self
            .voxel_block_size
            .component_mul(self.page_block_size.retag());
        self.dataset_size.component_div(block_voxels.retag()).retag()
    }

    pub fn voxel_block_size(&self) -> Size3<VoxelBlockScale> {
        self.voxel_block_size
    }

    pub fn page_block_size(&self) -> Size3<PageBlockScale> {
        self.page_block_size
    }

    pub fn dataset_size(&self) -> Size3<VoxelScale> {
        self.dataset_size
    }

    pub fn voxel_block_shift(&self) -> [u32; 3] {
        self.voxel_block_shift
    }

    pub fn page_shift(&self) -> [u32; 3] {
        self.page_shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PagingError;

    fn config(
        page_table: u32,
        voxel_cache: u32,
        page_block: u32,
        voxel_block: u32,
    ) -> PagingResult<CacheConfig> {
        CacheConfig::new(
            Size3::splat(page_table),
            Size3::splat(voxel_cache),
            Size3::splat(page_block),
            Size3::splat(voxel_block),
            Size3::splat(1 << 14),
        )
    }

    #[test]
    fn valid_config_builds() {
        assert!(config(128, 128, 32, 16).is_ok());
    }

    #[test]
    fn rejects_non_power_of_two() {
        let err = config(96, 128, 32, 16).unwrap_err();
        assert!(matches!(err, PagingError::NotPowerOfTwo { what: "page table size", .. }));
    }

    #[test]
    fn rejects_zero_extent() {
        let err = CacheConfig::new(
            Size3::splat(128),
            Size3::splat(128),
            Size3::splat(32),
            Size3::new(16, 0, 16),
            Size3::splat(1 << 14),
        )
        .unwrap_err();
        assert!(matches!(err, PagingError::ZeroExtent { what: "voxel block size", .. }));
    }

    #[test]
    fn rejects_non_divisible_sizes() {
        // 32 voxel cache with 64 blocks: power of two but not divisible.
        let err = config(128, 32, 32, 64).unwrap_err();
        assert!(matches!(err, PagingError::NotDivisible { what: "voxel cache size", .. }));
    }

    #[test]
    fn translation_shifts_to_each_granularity() {
        let cfg = config(128, 128, 4, 8).unwrap();
        let voxel = WorldCoord::new(255, 64, 7);
        // voxel block shift = 3, page shift = 3 + 2 = 5
        assert_eq!(cfg.to_voxel_block(voxel), WorldCoord::new(31, 8, 0));
        assert_eq!(cfg.to_page_block(voxel), WorldCoord::new(7, 2, 0));
    }

    #[test]
    fn slot_capacities_divide_out_block_sizes() {
        let cfg = config(128, 128, 32, 16).unwrap();
        assert_eq!(cfg.page_table_slots(), Size3::splat(4));
        assert_eq!(cfg.voxel_cache_slots(), Size3::splat(8));
    }

    #[test]
    fn page_directory_extent_covers_dataset() {
        let cfg = config(128, 128, 32, 16).unwrap();
        // 2^14 dataset / (16 * 32) voxels per page block = 32
        assert_eq!(cfg.page_directory_extent(), Size3::splat(32));
    }
}
