use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use voxel_paging::paging::*;
use voxel_paging::PagingResult;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Voxel Paging - Two-Level Cache Demo");
    println!("===================================");

    demo_address_translation()?;
    demo_cold_and_warm_access()?;
    demo_eviction_cascade()?;
    demo_empty_space_skipping()?;
    demo_random_workload()?;

    println!("\nAll scenarios passed!");
    Ok(())
}

fn demo_config() -> PagingResult<CacheConfig> {
    CacheConfig::new(
        Size3::splat(64),
        Size3::splat(256),
        Size3::splat(8),
        Size3::splat(32),
        Size3::splat(2048),
    )
}

fn demo_address_translation() -> anyhow::Result<()> {
    println!("\n1. Address Translation");
    println!("----------------------");

    let config = demo_config()?;
    let voxel = WorldCoord::new(1000, 40, 260);
    let voxel_block = config.to_voxel_block(voxel);
    let page_block = config.to_page_block(voxel);

    println!("voxel {:?}", (voxel.x, voxel.y, voxel.z));
    println!("  -> voxel block {:?}", (voxel_block.x, voxel_block.y, voxel_block.z));
    println!("  -> page block  {:?}", (page_block.x, page_block.y, page_block.z));

    assert_eq!((voxel_block.x, voxel_block.y, voxel_block.z), (31, 1, 8));
    assert_eq!((page_block.x, page_block.y, page_block.z), (3, 0, 1));

    let header = PagingGpuHeader::from_config(&config);
    println!(
        "GPU header: directory {}^3, page slots {}^3, voxel slots {}^3",
        header.directory_extent_x, header.page_table_slots_x, header.voxel_cache_slots_x
    );

    println!("✓ Translation checks passed");
    Ok(())
}

fn demo_cold_and_warm_access() -> anyhow::Result<()> {
    println!("\n2. Cold Miss and Warm Hit");
    println!("-------------------------");

    let mut cache = CacheRegistry::new(demo_config()?);

    let cold = cache.access_voxel(WorldCoord::new(100, 200, 300));
    println!(
        "cold access: {} voxel writes, {} page writes",
        cold.voxel_cache.len(),
        cold.page_table.len()
    );
    assert_eq!(cold.voxel_cache.len(), 1);
    assert_eq!(cold.page_table.len(), 1);

    let warm = cache.access_voxel(WorldCoord::new(101, 201, 301));
    println!("warm access is empty: {}", warm.is_empty());
    assert!(warm.is_empty());

    println!("✓ Access path checks passed");
    Ok(())
}

fn demo_eviction_cascade() -> anyhow::Result<()> {
    println!("\n3. Eviction Cascade");
    println!("-------------------");

    // Tiny cache: 2x2x2 slots in each level.
    let config = CacheConfig::new(
        Size3::splat(16),
        Size3::splat(64),
        Size3::splat(8),
        Size3::splat(32),
        Size3::splat(2048),
    )?;
    let mut cache = CacheRegistry::new(config);
    let voxel_slots = cache.config().voxel_cache_slots().volume();
    println!("voxel cache slots: {}", voxel_slots);

    let mut removals = 0usize;
    for i in 0..(voxel_slots as u32 * 3) {
        let delta = cache.access_voxel(WorldCoord::new(i * 32, 0, 0));
        removals += delta
            .page_table
            .iter()
            .filter(|d| d.state != MapState::Mapped)
            .count();
    }
    println!("page-table removal records under churn: {}", removals);
    assert!(removals > 0);

    let voxel_cache = cache.page_voxel().voxel_cache();
    assert_eq!(
        voxel_cache.registered_blocks() + voxel_cache.free_slots(),
        voxel_cache.capacity()
    );

    println!("✓ Cascade checks passed");
    Ok(())
}

fn demo_empty_space_skipping() -> anyhow::Result<()> {
    println!("\n4. Empty Space Skipping");
    println!("-----------------------");

    let mut cache = CacheRegistry::new(demo_config()?);
    let voxel = WorldCoord::new(500, 500, 500);
    let page_block = cache.config().to_page_block(voxel);

    let delta = cache.mark_empty_page_block(page_block);
    println!("tombstone delta: {} directory writes", delta.page_directory.len());
    assert_eq!(delta.page_directory.len(), 1);

    let skipped = cache.access_voxel(voxel);
    println!("access into empty space is a no-op: {}", skipped.is_empty());
    assert!(skipped.is_empty());

    println!("✓ Empty space checks passed");
    Ok(())
}

fn demo_random_workload() -> anyhow::Result<()> {
    println!("\n5. Random Workload");
    println!("------------------");

    let mut cache = CacheRegistry::new(demo_config()?);
    let mut rng = StdRng::seed_from_u64(42);

    let mut hits = 0usize;
    let mut misses = 0usize;
    let accesses = 10_000;

    for _ in 0..accesses {
        // A handful of hot regions plus uniform noise.
        let voxel = if rng.gen_bool(0.8) {
            let base = rng.gen_range(0..4u32) * 512;
            WorldCoord::new(
                base + rng.gen_range(0..64),
                base + rng.gen_range(0..64),
                base + rng.gen_range(0..64),
            )
        } else {
            WorldCoord::new(
                rng.gen_range(0..2048),
                rng.gen_range(0..2048),
                rng.gen_range(0..2048),
            )
        };

        if cache.access_voxel(voxel).is_empty() {
            hits += 1;
        } else {
            misses += 1;
        }
    }

    println!("accesses: {}, hits: {}, misses: {}", accesses, hits, misses);
    println!("hit rate: {:.1}%", 100.0 * hits as f64 / accesses as f64);
    assert!(hits > misses);

    let voxel_cache = cache.page_voxel().voxel_cache();
    let page_tables = cache.page_voxel().page_tables();
    println!(
        "resident: {} voxel blocks / {} slots, {} pages / {} slots",
        voxel_cache.registered_blocks(),
        voxel_cache.capacity(),
        page_tables.registered_blocks(),
        page_tables.capacity()
    );
    assert!(voxel_cache.registered_blocks() <= voxel_cache.capacity());
    assert!(page_tables.registered_blocks() <= page_tables.capacity());

    println!("✓ Workload checks passed");
    Ok(())
}
