// Two-level paging cache for out-of-core volume rendering
// Pure host-side bookkeeping; GPU textures are driven by the delta stream

pub mod block_registry;
pub mod config;
pub mod coords;
pub mod delta;
pub mod gpu;
pub mod lru;
pub mod page_directory;
pub mod page_voxel;
pub mod registry;

pub use block_registry::{BlockRegistry, CacheEntry, InfoSource};
pub use config::CacheConfig;
pub use coords::{
    PageBlockScale, PageDirectoryScale, Scale, Size3, SlotCoord, VoxelBlockScale, VoxelScale,
    WorldCoord,
};
pub use delta::{CacheDelta, MapState, PageDirectoryDelta, PageTableDelta, VoxelCacheDelta};
pub use gpu::{PageDirectoryTexel, PageTableTexel, PagingGpuHeader, VoxelCacheTexel};
pub use lru::LruMap;
pub use page_directory::PageDirectoryRegistry;
pub use page_voxel::{PageTableInfo, PageVoxelRegistry, VoxelCacheInfo};
pub use registry::CacheRegistry;

/// Default voxel block edge length (32x32x32 voxels)
pub const DEFAULT_VOXEL_BLOCK_SIZE: u32 = 32;

/// Default page block edge length in voxel blocks (8x8x8)
pub const DEFAULT_PAGE_BLOCK_SIZE: u32 = 8;
