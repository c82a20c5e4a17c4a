//! Scale-tagged coordinate and size types.
//!
//! The engine works with four coordinate granularities (voxel, voxel
//! block, page block, page directory) and two address spaces (the sparse
//! dataset "world" and the bounded physical cache). Mixing them up is the
//! classic source of paging bugs, so each triple carries a zero-sized
//! scale tag and the compiler refuses to cross the streams.

use std::marker::PhantomData;

/// Marker trait for coordinate granularities.
pub trait Scale: Copy + Eq + std::hash::Hash + std::fmt::Debug + 'static {}

/// A single sample in the dataset's finest grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct VoxelScale;

/// A fixed-size cube of voxels, the unit of residency in the voxel cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct VoxelBlockScale;

/// A fixed-size cube of voxel blocks, the unit of residency in the
/// page-table cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PageBlockScale;

/// The coarsest granularity, used by the sparse page directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PageDirectoryScale;

impl Scale for VoxelScale {}
impl Scale for VoxelBlockScale {}
impl Scale for PageBlockScale {}
impl Scale for PageDirectoryScale {}

/// A block position in the full, unbounded dataset address space.
///
/// Equality and hashing are by value; callers construct fresh coordinates
/// per lookup and the cache maps must not care.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct WorldCoord<S: Scale> {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    _scale: PhantomData<S>,
}

impl<S: Scale> WorldCoord<S> {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z, _scale: PhantomData }
    }

    pub const fn splat(v: u32) -> Self {
        Self::new(v, v, v)
    }

    /// Per-axis right shift, used by address translation.
    pub fn shr(self, shift: [u32; 3]) -> Self {
        Self::new(self.x >> shift[0], self.y >> shift[1], self.z >> shift[2])
    }

    /// Reinterpret the same triple at another granularity.
    ///
    /// Only address translation is allowed to do this; keep it out of
    /// call sites.
    pub(crate) fn retag<T: Scale>(self) -> WorldCoord<T> {
        WorldCoord::new(self.x, self.y, self.z)
    }
}

/// A physical slot inside a fixed-capacity cache, always in
/// `[0, size)` per axis. Distinct from the world coordinate the slot
/// currently represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SlotCoord<S: Scale> {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    _scale: PhantomData<S>,
}

impl<S: Scale> SlotCoord<S> {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z, _scale: PhantomData }
    }
}

/// A 3D extent at scale `S`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size3<S: Scale> {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    _scale: PhantomData<S>,
}

impl<S: Scale> Size3<S> {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z, _scale: PhantomData }
    }

    pub const fn splat(v: u32) -> Self {
        Self::new(v, v, v)
    }

    /// Total number of cells in this extent.
    pub fn volume(self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// True when every axis is a nonzero power of two.
    pub fn is_power_of_two(self) -> bool {
        self.x.is_power_of_two() && self.y.is_power_of_two() && self.z.is_power_of_two()
    }

    /// True when every axis of `self` divides evenly by `block`.
    pub fn is_divisible_by(self, block: Size3<S>) -> bool {
        block.x != 0
            && block.y != 0
            && block.z != 0
            && self.x % block.x == 0
            && self.y % block.y == 0
            && self.z % block.z == 0
    }

    /// Per-axis log2. Callers must have checked `is_power_of_two` first.
    pub fn log2(self) -> [u32; 3] {
        [
            self.x.trailing_zeros(),
            self.y.trailing_zeros(),
            self.z.trailing_zeros(),
        ]
    }

    pub fn component_div(self, other: Size3<S>) -> Size3<S> {
        Size3::new(self.x / other.x, self.y / other.y, self.z / other.z)
    }

    pub fn component_mul(self, other: Size3<S>) -> Size3<S> {
        Size3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    pub fn as_tuple(self) -> (u32, u32, u32) {
        (self.x, self.y, self.z)
    }

    pub(crate) fn retag<T: Scale>(self) -> Size3<T> {
        Size3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_coords_compare_by_value() {
        let a = WorldCoord::<VoxelBlockScale>::new(1, 2, 3);
        let b = WorldCoord::<VoxelBlockScale>::new(1, 2, 3);
        assert_eq!(a, b);
        assert_ne!(a, WorldCoord::new(3, 2, 1));
    }

    #[test]
    fn shr_shifts_each_axis() {
        let c = WorldCoord::<VoxelScale>::new(65, 32, 7).shr([5, 5, 5]);
        assert_eq!(c, WorldCoord::new(2, 1, 0));
    }

    #[test]
    fn volume_and_power_checks() {
        let s = Size3::<VoxelBlockScale>::new(4, 2, 8);
        assert_eq!(s.volume(), 64);
        assert!(s.is_power_of_two());
        assert!(!Size3::<VoxelBlockScale>::new(3, 2, 8).is_power_of_two());
        assert!(!Size3::<VoxelBlockScale>::new(0, 2, 8).is_power_of_two());
    }

    #[test]
    fn divisibility() {
        let s = Size3::<VoxelBlockScale>::splat(128);
        assert!(s.is_divisible_by(Size3::splat(32)));
        assert!(!s.is_divisible_by(Size3::new(32, 48, 32)));
        assert!(!s.is_divisible_by(Size3::splat(0)));
    }

    #[test]
    fn log2_of_powers() {
        assert_eq!(Size3::<VoxelScale>::new(1, 32, 1024).log2(), [0, 5, 10]);
    }
}
