use karst_blocks::BlockId;

use crate::grid::BlockGrid;
use crate::world::World;

/// Terrain collaborator consumed by the generation pipeline.
///
/// The bulk passes work on flattened arrays (`heights` is one scalar per
/// `(x, z)` column, x fastest; `block_types` uses the world's
/// `flatten_index` order); the overlay passes mutate the grid in place.
pub trait TerrainSource {
    /// Height field in `[0, 1]`, `width * depth` scalars, x fastest.
    fn heights(&mut self, width: usize, depth: usize) -> Vec<f32>;

    /// One block type per voxel, flattened with [`World::flatten_index`].
    fn block_types(&mut self, world: &World, heights: &[f32]) -> Vec<BlockId>;

    /// Overlay water into air columns up to the sea level.
    fn add_water(&mut self, world: &World, grid: &mut BlockGrid);

    /// Overlay trees/vegetation onto the surface.
    fn add_trees(&mut self, world: &World, grid: &mut BlockGrid, probability: f32);
}
