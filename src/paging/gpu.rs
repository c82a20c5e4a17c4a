//! GPU-side layout of the cache state.
//!
//! The host never uploads whole cache levels; it uploads a constant
//! header once and then replays [`CacheDelta`] records as individual
//! texel writes. The structs here are the byte layouts of those uploads.

use bytemuck::{Pod, Zeroable};

use super::config::CacheConfig;
use super::delta::{MapState, PageTableDelta, VoxelCacheDelta};

/// Constant per-dataset header the shader needs to walk the hierarchy.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PagingGpuHeader {
    /// Page directory extent in page blocks
    pub directory_extent_x: u32,
    pub directory_extent_y: u32,
    pub directory_extent_z: u32,

    /// Page table capacity in page-block slots
    pub page_table_slots_x: u32,
    pub page_table_slots_y: u32,
    pub page_table_slots_z: u32,

    /// Voxel cache capacity in voxel-block slots
    pub voxel_cache_slots_x: u32,
    pub voxel_cache_slots_y: u32,
    pub voxel_cache_slots_z: u32,

    /// Per-axis shift from voxel to voxel-block coordinates
    pub voxel_block_shift: [u32; 3],

    /// Per-axis shift from voxel to page-block coordinates
    pub page_shift: [u32; 3],

    /// Padding for alignment
    pub _padding: [u32; 1],
}

impl PagingGpuHeader {
    pub fn from_config(config: &CacheConfig) -> Self {
        let directory = config.page_directory_extent().as_tuple();
        let pages = config.page_table_slots().as_tuple();
        let voxels = config.voxel_cache_slots().as_tuple();
        Self {
            directory_extent_x: directory.0,
            directory_extent_y: directory.1,
            directory_extent_z: directory.2,
            page_table_slots_x: pages.0,
            page_table_slots_y: pages.1,
            page_table_slots_z: pages.2,
            voxel_cache_slots_x: voxels.0,
            voxel_cache_slots_y: voxels.1,
            voxel_cache_slots_z: voxels.2,
            voxel_block_shift: config.voxel_block_shift(),
            page_shift: config.page_shift(),
            _padding: [0],
        }
    }
}

/// One page-table texel: residency state plus the voxel-cache slot the
/// entry points at. A zeroed texel reads as `NotMapped`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct PageTableTexel {
    pub state: u32,
    pub entry_x: u32,
    pub entry_y: u32,
    pub entry_z: u32,
}

impl PageTableTexel {
    pub fn from_delta(delta: &PageTableDelta) -> Self {
        let entry = delta
            .entry
            .map(|slot| (slot.x, slot.y, slot.z))
            .unwrap_or((0, 0, 0));
        Self {
            state: delta.state.to_u32(),
            entry_x: entry.0,
            entry_y: entry.1,
            entry_z: entry.2,
        }
    }
}

/// One voxel-cache bookkeeping texel: residency state plus the world
/// voxel block the slot holds. A zeroed texel reads as `NotMapped`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct VoxelCacheTexel {
    pub state: u32,
    pub entry_x: u32,
    pub entry_y: u32,
    pub entry_z: u32,
}

impl VoxelCacheTexel {
    pub fn from_delta(delta: &VoxelCacheDelta) -> Self {
        let entry = delta
            .entry
            .map(|world| (world.x, world.y, world.z))
            .unwrap_or((0, 0, 0));
        Self {
            state: delta.state.to_u32(),
            entry_x: entry.0,
            entry_y: entry.1,
            entry_z: entry.2,
        }
    }
}

/// One page-directory texel.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct PageDirectoryTexel {
    pub state: u32,
}

impl PageDirectoryTexel {
    pub fn new(state: MapState) -> Self {
        Self { state: state.to_u32() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::coords::{Size3, SlotCoord, WorldCoord};

    #[test]
    fn header_matches_config_geometry() {
        let config = CacheConfig::new(
            Size3::splat(4),
            Size3::splat(8),
            Size3::splat(2),
            Size3::splat(4),
            Size3::splat(64),
        )
        .expect("valid test config");

        let header = PagingGpuHeader::from_config(&config);
        assert_eq!(header.directory_extent_x, 8);
        assert_eq!(header.page_table_slots_x, 2);
        assert_eq!(header.voxel_cache_slots_x, 2);
        assert_eq!(header.voxel_block_shift, [2, 2, 2]);
        assert_eq!(header.page_shift, [3, 3, 3]);
        assert_eq!(std::mem::size_of::<PagingGpuHeader>() % 16, 0);
    }

    #[test]
    fn zeroed_texels_read_as_not_mapped() {
        let texel: PageTableTexel = Zeroable::zeroed();
        assert_eq!(texel.state, MapState::NotMapped.to_u32());
        let texel: VoxelCacheTexel = Zeroable::zeroed();
        assert_eq!(texel.state, MapState::NotMapped.to_u32());
    }

    #[test]
    fn mapped_delta_encodes_slot_pointer() {
        let delta = PageTableDelta::block_mapped(
            SlotCoord::new(1, 0, 0),
            SlotCoord::new(3, 2, 1),
            WorldCoord::splat(5),
        );
        let texel = PageTableTexel::from_delta(&delta);
        assert_eq!(texel.state, MapState::Mapped.to_u32());
        assert_eq!((texel.entry_x, texel.entry_y, texel.entry_z), (3, 2, 1));
    }

    #[test]
    fn removal_delta_encodes_state_only() {
        let delta = VoxelCacheDelta::block_removed(SlotCoord::new(0, 0, 0), MapState::Empty);
        let texel = VoxelCacheTexel::from_delta(&delta);
        assert_eq!(texel.state, MapState::Empty.to_u32());
        assert_eq!((texel.entry_x, texel.entry_y, texel.entry_z), (0, 0, 0));
    }
}
