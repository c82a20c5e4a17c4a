//! Dataset-wide page directory.
//!
//! One entry per page block of the full dataset, so unlike the two
//! bounded caches it never evicts. Only tombstones are tracked host-side;
//! mapped locations live in the delta stream for the GPU copy.

use rustc_hash::FxHashMap;

use super::config::CacheConfig;
use super::coords::{PageBlockScale, PageDirectoryScale, Size3, WorldCoord};
use super::delta::{CacheDelta, MapState, PageDirectoryDelta};

pub struct PageDirectoryRegistry {
    extent: Size3<PageDirectoryScale>,
    states: FxHashMap<WorldCoord<PageBlockScale>, MapState>,
}

impl PageDirectoryRegistry {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            extent: config.page_directory_extent(),
            states: FxHashMap::default(),
        }
    }

    /// Directory extent in page blocks, the address space of the GPU-side
    /// directory texture.
    pub fn extent(&self) -> Size3<PageDirectoryScale> {
        self.extent
    }

    /// Permanently record a page block as empty.
    pub fn mark_empty(&mut self, page_block: WorldCoord<PageBlockScale>) -> CacheDelta {
        self.states.insert(page_block, MapState::Empty);
        let mut delta = CacheDelta::default();
        delta
            .page_directory
            .push(PageDirectoryDelta { page_block, state: MapState::Empty });
        delta
    }

    /// True only for page blocks explicitly marked empty; an unrecorded
    /// block is unknown, not empty.
    pub fn is_empty(&self, page_block: WorldCoord<PageBlockScale>) -> bool {
        self.states.get(&page_block) == Some(&MapState::Empty)
    }

    pub fn tombstone_count(&self) -> usize {
        self.states.len()
    }
}
