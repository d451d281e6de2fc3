//! Runtime block mutations: mining hits and building, with minimal
//! dirty-chunk invalidation.
#![forbid(unsafe_code)]

use karst_blocks::{Block, BlockId, BlockRegistry};
use karst_chunk::{ChunkMap, ChunkStatus};
use karst_mesh::Mesher;
use karst_world::{BlockGrid, World};

/// Crack tier for the remaining hit points:
/// `round((1 - hp/max) * levels)`, clamped to `[0, levels]`.
#[inline]
pub fn crack_level(hit_points: u8, max_hit_points: u8, levels: u8) -> u8 {
    if max_hit_points == 0 {
        return 0;
    }
    let ratio = f32::from(hit_points) / f32::from(max_hit_points);
    (((1.0 - ratio) * f32::from(levels)).round() as i32).clamp(0, i32::from(levels)) as u8
}

/// Raise a chunk to a dirty state without ever downgrading a pending
/// recreate to a redraw. `NotReady` chunks are left alone.
fn mark_dirty(chunks: &mut ChunkMap, world: &World, x: i32, y: i32, z: i32, status: ChunkStatus) {
    let coord = world.chunk_coord_of(x, y, z);
    let Some(entry) = chunks.get_mut(coord) else {
        log::warn!("mutation at ({x},{y},{z}) maps to no chunk entry");
        return;
    };
    match entry.status {
        ChunkStatus::NotReady => {}
        ChunkStatus::NeedsRecreate => {}
        _ => entry.status = status,
    }
}

/// Apply one mining hit. Returns `true` when the block was destroyed.
///
/// Hitting air is an upstream coordinate bug, not a user action: it is
/// logged and aborted with no state change.
pub fn hit_block(
    world: &World,
    grid: &mut BlockGrid,
    chunks: &mut ChunkMap,
    mesher: &mut dyn Mesher,
    reg: &BlockRegistry,
    x: i32,
    y: i32,
    z: i32,
) -> bool {
    if !world.contains(x, y, z) {
        log::warn!("hit outside world bounds at ({x},{y},{z})");
        return false;
    }
    let (ux, uy, uz) = (x as usize, y as usize, z as usize);
    let mut b = grid.get(ux, uy, uz);
    if b.is_air() {
        log::warn!("hit an air block at ({x},{y},{z}); caller coordinates are wrong");
        return false;
    }

    b.hit_points = b.hit_points.saturating_sub(1);
    if b.hit_points == 0 {
        grid.set(ux, uy, uz, Block::AIR);
        // Destroying a block can expose new faces on all six sides.
        mesher.recalculate_faces_around(world, grid, x, y, z);
        mark_dirty(chunks, world, x, y, z, ChunkStatus::NeedsRecreate);
        return true;
    }

    let max = reg.max_hit_points(b.id);
    let level = crack_level(b.hit_points, max, reg.crack_levels);
    let changed = level != b.health_level;
    b.health_level = level;
    grid.set(ux, uy, uz, b);
    if changed {
        // Only the crack overlay moved tiers; topology is intact, so the
        // collider does not need to be rebuilt.
        mark_dirty(chunks, world, x, y, z, ChunkStatus::NeedsRedraw);
    }
    false
}

/// Place a block into an air voxel. Returns `true` when the block was
/// placed; an occupied target is rejected silently.
pub fn build_block(
    world: &World,
    grid: &mut BlockGrid,
    chunks: &mut ChunkMap,
    mesher: &mut dyn Mesher,
    reg: &BlockRegistry,
    x: i32,
    y: i32,
    z: i32,
    id: BlockId,
) -> bool {
    if !world.contains(x, y, z) {
        log::warn!("build outside world bounds at ({x},{y},{z})");
        return false;
    }
    let (ux, uy, uz) = (x as usize, y as usize, z as usize);
    if !grid.get(ux, uy, uz).is_air() {
        log::debug!("build rejected at occupied voxel ({x},{y},{z})");
        return false;
    }
    grid.set(ux, uy, uz, reg.make_block(id));
    // A newly solid block can hide previously visible neighbor faces.
    mesher.recalculate_faces_around(world, grid, x, y, z);
    mark_dirty(chunks, world, x, y, z, ChunkStatus::NeedsRecreate);
    true
}
