//! Change-set types describing the side effects of one cache operation.
//!
//! The caller mirrors every record into the GPU-resident page-directory,
//! page-table, and voxel-cache textures; `cache_block` is the texel
//! address, the rest is the payload. It never needs to re-read full cache
//! state: the delta is the complete, ordered log of what changed, with
//! removal records before addition records.

use super::coords::{PageBlockScale, SlotCoord, VoxelBlockScale, WorldCoord};

/// Residency state of a block as recorded in a page-table entry.
///
/// `Empty` is a tombstone: the block is known to contain no data and must
/// not be fetched again. Absence of an entry altogether means "unknown",
/// which is a different thing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapState {
    NotMapped,
    Mapped,
    Empty,
}

impl MapState {
    /// Texel encoding. `NotMapped` is zero so a cleared texture reads as
    /// fully unmapped.
    pub fn to_u32(self) -> u32 {
        match self {
            MapState::NotMapped => 0,
            MapState::Mapped => 1,
            MapState::Empty => 2,
        }
    }
}

/// One voxel-cache texel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelCacheDelta {
    pub cache_block: SlotCoord<VoxelBlockScale>,
    pub state: MapState,
    /// The world voxel block now held by the slot; only set when mapping.
    pub entry: Option<WorldCoord<VoxelBlockScale>>,
}

impl VoxelCacheDelta {
    pub fn block_removed(cache_block: SlotCoord<VoxelBlockScale>, state: MapState) -> Self {
        Self { cache_block, state, entry: None }
    }

    pub fn block_mapped(
        cache_block: SlotCoord<VoxelBlockScale>,
        entry: WorldCoord<VoxelBlockScale>,
    ) -> Self {
        Self { cache_block, state: MapState::Mapped, entry: Some(entry) }
    }
}

/// One page-table texel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTableDelta {
    pub cache_block: SlotCoord<PageBlockScale>,
    pub state: MapState,
    /// Voxel-cache slot an individual entry now points at; only set when
    /// mapping.
    pub entry: Option<SlotCoord<VoxelBlockScale>>,
    /// Which voxel block within the page the record is about; absent for
    /// whole-page removal.
    pub location: Option<WorldCoord<VoxelBlockScale>>,
}

impl PageTableDelta {
    /// The entire page entry is gone (evicted or marked empty).
    pub fn page_removed(cache_block: SlotCoord<PageBlockScale>, state: MapState) -> Self {
        Self { cache_block, state, entry: None, location: None }
    }

    /// A single voxel block inside the page was unmapped or tombstoned.
    pub fn block_unmapped(
        cache_block: SlotCoord<PageBlockScale>,
        state: MapState,
        location: WorldCoord<VoxelBlockScale>,
    ) -> Self {
        Self { cache_block, state, entry: None, location: Some(location) }
    }

    /// A single voxel block inside the page now maps to a voxel-cache slot.
    pub fn block_mapped(
        cache_block: SlotCoord<PageBlockScale>,
        entry: SlotCoord<VoxelBlockScale>,
        location: WorldCoord<VoxelBlockScale>,
    ) -> Self {
        Self {
            cache_block,
            state: MapState::Mapped,
            entry: Some(entry),
            location: Some(location),
        }
    }
}

/// One page-directory write. The directory is sparse and addressed by the
/// page-block world coordinate directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageDirectoryDelta {
    pub page_block: WorldCoord<PageBlockScale>,
    pub state: MapState,
}

/// The accumulated side effects of one cache operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheDelta {
    pub voxel_cache: Vec<VoxelCacheDelta>,
    pub page_table: Vec<PageTableDelta>,
    pub page_directory: Vec<PageDirectoryDelta>,
}

impl CacheDelta {
    /// True when the operation changed nothing.
    pub fn is_empty(&self) -> bool {
        self.voxel_cache.is_empty() && self.page_table.is_empty() && self.page_directory.is_empty()
    }

    /// Append another delta's records after this one's.
    pub fn merge(&mut self, other: CacheDelta) {
        self.voxel_cache.extend(other.voxel_cache);
        self.page_table.extend(other.page_table);
        self.page_directory.extend(other.page_directory);
    }
}
