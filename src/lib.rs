pub mod error;
pub mod paging;

pub use error::{PagingError, PagingResult};
pub use paging::{
    CacheConfig, CacheDelta, CacheEntry, CacheRegistry, LruMap, MapState, PageBlockScale,
    PageDirectoryRegistry, PageDirectoryTexel, PageTableDelta, PageTableTexel, PagingGpuHeader,
    PageVoxelRegistry, Scale, Size3, SlotCoord, VoxelBlockScale, VoxelCacheDelta, VoxelCacheTexel,
    VoxelScale, WorldCoord,
};
