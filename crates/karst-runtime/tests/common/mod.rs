use karst_blocks::{Block, BlockId, BlockRegistry};
use karst_world::{BlockGrid, TerrainSource, World};

/// Deterministic terrain for pipeline tests: a solid slab of stone
/// `floor_layers` deep, no water, no trees.
pub struct FlatTerrain {
    pub floor_layers: usize,
    stone: BlockId,
    pub water_calls: usize,
    pub tree_calls: usize,
}

impl FlatTerrain {
    pub fn new(reg: &BlockRegistry, floor_layers: usize) -> Self {
        Self {
            floor_layers,
            stone: reg.id_by_name("stone").expect("default table has stone"),
            water_calls: 0,
            tree_calls: 0,
        }
    }
}

impl TerrainSource for FlatTerrain {
    fn heights(&mut self, width: usize, depth: usize) -> Vec<f32> {
        vec![0.5; width * depth]
    }

    fn block_types(&mut self, world: &World, heights: &[f32]) -> Vec<BlockId> {
        assert_eq!(heights.len(), world.size_x() * world.size_z());
        let mut out = vec![Block::AIR.id; world.volume()];
        for z in 0..world.size_z() {
            for x in 0..world.size_x() {
                for y in 0..self.floor_layers.min(world.size_y()) {
                    out[world.flatten_index(x, y, z)] = self.stone;
                }
            }
        }
        out
    }

    fn add_water(&mut self, _world: &World, _grid: &mut BlockGrid) {
        self.water_calls += 1;
    }

    fn add_trees(&mut self, _world: &World, _grid: &mut BlockGrid, _probability: f32) {
        self.tree_calls += 1;
    }
}
