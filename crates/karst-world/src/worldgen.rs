use std::error::Error;
use std::fs;
use std::path::Path;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;

use karst_blocks::{Block, BlockId, BlockRegistry};

use crate::grid::BlockGrid;
use crate::terrain::TerrainSource;
use crate::world::World;

#[derive(Clone, Debug, Deserialize)]
pub struct WorldGenParams {
    /// Noise frequency for the height field.
    #[serde(default = "default_height_frequency")]
    pub height_frequency: f32,
    /// Base terrain height as a fraction of the world Y extent.
    #[serde(default = "default_base_height")]
    pub base_height: f32,
    /// Relief amplitude as a fraction of the world Y extent.
    #[serde(default = "default_relief")]
    pub relief: f32,
    /// Dirt layer thickness under the surface block.
    #[serde(default = "default_dirt_depth")]
    pub dirt_depth: i32,
    /// Sea level as a fraction of the world Y extent.
    #[serde(default = "default_sea_level")]
    pub sea_level: f32,
    /// Default per-column tree probability handed to the pipeline.
    #[serde(default = "default_tree_probability")]
    pub tree_probability: f32,
}

fn default_height_frequency() -> f32 {
    0.015
}
fn default_base_height() -> f32 {
    0.35
}
fn default_relief() -> f32 {
    0.30
}
fn default_dirt_depth() -> i32 {
    3
}
fn default_sea_level() -> f32 {
    0.30
}
fn default_tree_probability() -> f32 {
    0.03
}

impl Default for WorldGenParams {
    fn default() -> Self {
        Self {
            height_frequency: default_height_frequency(),
            base_height: default_base_height(),
            relief: default_relief(),
            dirt_depth: default_dirt_depth(),
            sea_level: default_sea_level(),
            tree_probability: default_tree_probability(),
        }
    }
}

impl WorldGenParams {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

fn resolve_block_id(reg: &BlockRegistry, name: &str) -> BlockId {
    match reg.id_by_name(name) {
        Some(id) => id,
        None => Block::AIR.id,
    }
}

/// Reference [`TerrainSource`] built on OpenSimplex2 noise: layered
/// grass/dirt/stone columns, sea-level water fill, noise-thresholded trees.
pub struct NoiseTerrain {
    height: FastNoiseLite,
    tree: FastNoiseLite,
    params: WorldGenParams,
    grass: BlockId,
    dirt: BlockId,
    stone: BlockId,
    sand: BlockId,
    water: Block,
    wood: Block,
    leaves: Block,
}

impl NoiseTerrain {
    pub fn new(seed: i32, params: WorldGenParams, reg: &BlockRegistry) -> Self {
        let mut height = FastNoiseLite::with_seed(seed);
        height.set_noise_type(Some(NoiseType::OpenSimplex2));
        height.set_frequency(Some(params.height_frequency));
        let mut tree = FastNoiseLite::with_seed(seed ^ 41_337);
        tree.set_noise_type(Some(NoiseType::OpenSimplex2));
        tree.set_frequency(Some(0.8));
        Self {
            height,
            tree,
            grass: resolve_block_id(reg, "grass"),
            dirt: resolve_block_id(reg, "dirt"),
            stone: resolve_block_id(reg, "stone"),
            sand: resolve_block_id(reg, "sand"),
            water: reg.make_block(resolve_block_id(reg, "water")),
            wood: reg.make_block(resolve_block_id(reg, "wood")),
            leaves: reg.make_block(resolve_block_id(reg, "leaves")),
            params,
        }
    }

    pub fn params(&self) -> &WorldGenParams {
        &self.params
    }

    #[inline]
    fn sea_level_y(&self, world: &World) -> i32 {
        (world.size_y() as f32 * self.params.sea_level) as i32
    }

    #[inline]
    fn surface_y(&self, world: &World, h: f32) -> i32 {
        let sy = world.size_y() as f32;
        let base = sy * self.params.base_height;
        let relief = sy * self.params.relief;
        ((base + h * relief) as i32).clamp(1, world.size_y() as i32 - 1)
    }

    /// Topmost non-air block of a column, if any.
    fn surface_of_column(&self, world: &World, grid: &BlockGrid, x: usize, z: usize) -> Option<usize> {
        (0..world.size_y()).rev().find(|&y| !grid.get(x, y, z).is_air())
    }
}

impl TerrainSource for NoiseTerrain {
    fn heights(&mut self, width: usize, depth: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(width * depth);
        for z in 0..depth {
            for x in 0..width {
                let n = self.height.get_noise_2d(x as f32, z as f32);
                out.push((n * 0.5 + 0.5).clamp(0.0, 1.0));
            }
        }
        out
    }

    fn block_types(&mut self, world: &World, heights: &[f32]) -> Vec<BlockId> {
        let (sx, sy, sz) = (world.size_x(), world.size_y(), world.size_z());
        let sea = self.sea_level_y(world);
        let mut out = vec![Block::AIR.id; world.volume()];
        for z in 0..sz {
            for x in 0..sx {
                let surface = self.surface_y(world, heights[z * sx + x]);
                // Beaches where the surface meets the waterline.
                let top = if surface <= sea + 1 { self.sand } else { self.grass };
                for y in 0..sy as i32 {
                    let id = if y > surface {
                        Block::AIR.id
                    } else if y == surface {
                        top
                    } else if y >= surface - self.params.dirt_depth {
                        self.dirt
                    } else {
                        self.stone
                    };
                    out[world.flatten_index(x, y as usize, z)] = id;
                }
            }
        }
        out
    }

    fn add_water(&mut self, world: &World, grid: &mut BlockGrid) {
        let sea = self.sea_level_y(world).min(world.size_y() as i32 - 1);
        for z in 0..world.size_z() {
            for x in 0..world.size_x() {
                for y in 0..=sea as usize {
                    if grid.get(x, y, z).is_air() {
                        grid.set(x, y, z, self.water);
                    }
                }
            }
        }
    }

    fn add_trees(&mut self, world: &World, grid: &mut BlockGrid, probability: f32) {
        let (sx, sy, sz) = (world.size_x(), world.size_y(), world.size_z());
        for z in 0..sz {
            for x in 0..sx {
                let n = self.tree.get_noise_2d(x as f32, z as f32);
                let v = (n * 0.5 + 0.5).clamp(0.0, 1.0);
                if v >= probability {
                    continue;
                }
                let Some(surface) = self.surface_of_column(world, grid, x, z) else {
                    continue;
                };
                if grid.get(x, surface, z).id != self.grass {
                    continue;
                }
                let trunk_h = 3 + ((v * 1000.0) as usize % 3);
                if surface + trunk_h + 2 >= sy {
                    continue;
                }
                for dy in 1..=trunk_h {
                    grid.set(x, surface + dy, z, self.wood);
                }
                let canopy_y = surface + trunk_h + 1;
                for dz in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let (lx, lz) = (x as i32 + dx, z as i32 + dz);
                        if lx < 0 || lz < 0 || lx as usize >= sx || lz as usize >= sz {
                            continue;
                        }
                        if grid.get(lx as usize, canopy_y, lz as usize).is_air() {
                            grid.set(lx as usize, canopy_y, lz as usize, self.leaves);
                        }
                    }
                }
            }
        }
    }
}
