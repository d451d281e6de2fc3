//! World sizing, chunk coordinates, the dense block grid, and the terrain seam.
#![forbid(unsafe_code)]

pub mod coord;
pub mod grid;
pub mod terrain;
pub mod world;
pub mod worldgen;

pub use coord::ChunkCoord;
pub use grid::BlockGrid;
pub use terrain::TerrainSource;
pub use world::{CHUNK_SIZE, GenerationStatus, World};
pub use worldgen::{NoiseTerrain, WorldGenParams};
