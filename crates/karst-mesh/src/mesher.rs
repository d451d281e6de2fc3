use karst_blocks::BlockRegistry;
use karst_world::{BlockGrid, ChunkCoord, World};

use crate::data::{ChunkMeshes, MeshData};
use crate::face::{ALL_FACES, Face};
use crate::masks::FaceMasks;

/// Meshing collaborator consumed by the pipeline, the mutation engine, and
/// the rebuild scheduler. Implementations own their visibility masks; the
/// whole-grid passes run once per generation/load, the localized pass runs
/// on every mutation.
pub trait Mesher {
    /// Whole-grid visibility pass: a face is visible when its neighbor is
    /// air or outside the world bounds.
    fn calculate_face_visibility(&mut self, world: &World, grid: &BlockGrid);

    /// Edge-correction pass: faces on the world hull are never left exposed
    /// toward a nonexistent neighbor.
    fn boundary_check(&mut self, world: &World, grid: &BlockGrid);

    /// Localized pass for a mutated block and its six face-neighbors.
    fn recalculate_faces_around(&mut self, world: &World, grid: &BlockGrid, x: i32, y: i32, z: i32);

    /// Per-chunk mesh pair, from the current masks.
    fn build_meshes(&self, world: &World, grid: &BlockGrid, coord: ChunkCoord) -> ChunkMeshes;

    /// Redraw path: a fresh terrain mesh only, the water mesh is not
    /// requested.
    fn build_terrain_mesh(&self, world: &World, grid: &BlockGrid, coord: ChunkCoord) -> MeshData {
        self.build_meshes(world, grid, coord).terrain
    }
}

/// Reference mesher: per-face culled quads, no greedy merging. Solid blocks
/// feed the terrain mesh with their crack tier in the UV channel; non-solid
/// non-air blocks (water) feed the water mesh.
pub struct CullMesher {
    reg: BlockRegistry,
    masks: FaceMasks,
}

impl CullMesher {
    pub fn new(reg: &BlockRegistry) -> Self {
        Self {
            reg: reg.clone(),
            masks: FaceMasks::sized(0, 0, 0),
        }
    }

    pub fn masks(&self) -> &FaceMasks {
        &self.masks
    }

    fn ensure_sized(&mut self, world: &World) {
        if !self
            .masks
            .matches_dims(world.size_x(), world.size_y(), world.size_z())
        {
            self.masks = FaceMasks::sized(world.size_x(), world.size_y(), world.size_z());
        }
    }

    /// Net visibility of one cell once boundary correction is applied:
    /// visible only toward an in-bounds air neighbor. Used by the localized
    /// pass so it agrees with the two whole-grid passes combined.
    fn recompute_cell(&mut self, world: &World, grid: &BlockGrid, x: i32, y: i32, z: i32) {
        if !world.contains(x, y, z) {
            return;
        }
        let (ux, uy, uz) = (x as usize, y as usize, z as usize);
        let solid_here = !grid.get(ux, uy, uz).is_air();
        for face in ALL_FACES {
            let (dx, dy, dz) = face.delta();
            let visible = solid_here
                && matches!(grid.get_checked(x + dx, y + dy, z + dz), Some(n) if n.is_air());
            self.masks.set(ux, uy, uz, face, visible);
        }
    }
}

impl Mesher for CullMesher {
    fn calculate_face_visibility(&mut self, world: &World, grid: &BlockGrid) {
        self.ensure_sized(world);
        for y in 0..world.size_y() {
            for z in 0..world.size_z() {
                for x in 0..world.size_x() {
                    if grid.get(x, y, z).is_air() {
                        for face in ALL_FACES {
                            self.masks.set(x, y, z, face, false);
                        }
                        continue;
                    }
                    for face in ALL_FACES {
                        let (dx, dy, dz) = face.delta();
                        let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
                        let visible = match grid.get_checked(nx, ny, nz) {
                            Some(n) => n.is_air(),
                            // Out of bounds counts as exposed until the
                            // boundary pass corrects the hull.
                            None => true,
                        };
                        self.masks.set(x, y, z, face, visible);
                    }
                }
            }
        }
    }

    fn boundary_check(&mut self, world: &World, grid: &BlockGrid) {
        self.ensure_sized(world);
        let _ = grid;
        let (sx, sy, sz) = (world.size_x(), world.size_y(), world.size_z());
        for y in 0..sy {
            for z in 0..sz {
                for x in 0..sx {
                    if x == 0 {
                        self.masks.set(x, y, z, Face::NegX, false);
                    }
                    if x == sx - 1 {
                        self.masks.set(x, y, z, Face::PosX, false);
                    }
                    if y == 0 {
                        self.masks.set(x, y, z, Face::NegY, false);
                    }
                    if y == sy - 1 {
                        self.masks.set(x, y, z, Face::PosY, false);
                    }
                    if z == 0 {
                        self.masks.set(x, y, z, Face::NegZ, false);
                    }
                    if z == sz - 1 {
                        self.masks.set(x, y, z, Face::PosZ, false);
                    }
                }
            }
        }
    }

    fn recalculate_faces_around(&mut self, world: &World, grid: &BlockGrid, x: i32, y: i32, z: i32) {
        self.ensure_sized(world);
        self.recompute_cell(world, grid, x, y, z);
        for face in ALL_FACES {
            let (dx, dy, dz) = face.delta();
            self.recompute_cell(world, grid, x + dx, y + dy, z + dz);
        }
    }

    fn build_meshes(&self, world: &World, grid: &BlockGrid, coord: ChunkCoord) -> ChunkMeshes {
        if !self
            .masks
            .matches_dims(world.size_x(), world.size_y(), world.size_z())
        {
            log::warn!("build_meshes called before the visibility pass; returning empty meshes");
            return ChunkMeshes::default();
        }
        let mut terrain = MeshData::default();
        let mut water = MeshData::default();
        let (ox, oy, oz) = world.origin_of(coord);
        let e = world.chunk_size as i32;
        for y in oy..(oy + e).min(world.size_y() as i32) {
            for z in oz..(oz + e).min(world.size_z() as i32) {
                for x in ox..(ox + e).min(world.size_x() as i32) {
                    let (ux, uy, uz) = (x as usize, y as usize, z as usize);
                    let b = grid.get(ux, uy, uz);
                    if b.is_air() {
                        continue;
                    }
                    let solid = self.reg.is_solid(b.id);
                    for face in ALL_FACES {
                        if !self.masks.is_visible(ux, uy, uz, face) {
                            continue;
                        }
                        if solid {
                            terrain.add_face(x, y, z, face, b.health_level);
                        } else {
                            water.add_face(x, y, z, face, 0);
                        }
                    }
                }
            }
        }
        ChunkMeshes { terrain, water }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karst_blocks::Block;

    fn setup(edge: usize, chunks: usize) -> (World, BlockGrid, BlockRegistry, CullMesher) {
        let reg = BlockRegistry::with_defaults();
        let world = World::with_chunk_size(edge, chunks, chunks, chunks, 0);
        let grid = BlockGrid::allocate(world.size_x(), world.size_y(), world.size_z());
        let mesher = CullMesher::new(&reg);
        (world, grid, reg, mesher)
    }

    fn stone(reg: &BlockRegistry) -> Block {
        reg.make_block(reg.id_by_name("stone").unwrap())
    }

    #[test]
    fn lone_block_shows_six_faces() {
        let (world, mut grid, reg, mut mesher) = setup(8, 1);
        grid.set(4, 4, 4, stone(&reg));
        mesher.calculate_face_visibility(&world, &grid);
        mesher.boundary_check(&world, &grid);
        assert_eq!(mesher.masks().count_at(4, 4, 4), 6);
        let meshes = mesher.build_meshes(&world, &grid, world.chunk_coord_of(4, 4, 4));
        assert_eq!(meshes.terrain.quad_count(), 6);
        assert!(meshes.water.is_empty());
    }

    #[test]
    fn touching_blocks_hide_shared_faces() {
        let (world, mut grid, reg, mut mesher) = setup(8, 1);
        grid.set(3, 4, 4, stone(&reg));
        grid.set(4, 4, 4, stone(&reg));
        mesher.calculate_face_visibility(&world, &grid);
        assert!(!mesher.masks().is_visible(3, 4, 4, Face::PosX));
        assert!(!mesher.masks().is_visible(4, 4, 4, Face::NegX));
        assert_eq!(mesher.masks().count_at(3, 4, 4), 5);
        assert_eq!(mesher.masks().count_at(4, 4, 4), 5);
    }

    #[test]
    fn boundary_pass_closes_the_world_hull() {
        let (world, mut grid, reg, mut mesher) = setup(4, 1);
        grid.set(0, 0, 0, stone(&reg));
        mesher.calculate_face_visibility(&world, &grid);
        // Before correction the corner block believes its three hull faces
        // are exposed.
        assert_eq!(mesher.masks().count_at(0, 0, 0), 6);
        mesher.boundary_check(&world, &grid);
        assert_eq!(mesher.masks().count_at(0, 0, 0), 3);
        assert!(!mesher.masks().is_visible(0, 0, 0, Face::NegX));
        assert!(!mesher.masks().is_visible(0, 0, 0, Face::NegY));
        assert!(!mesher.masks().is_visible(0, 0, 0, Face::NegZ));
    }

    #[test]
    fn localized_pass_agrees_with_full_passes() {
        let (world, mut grid, reg, mut mesher) = setup(8, 1);
        grid.set(4, 4, 4, stone(&reg));
        grid.set(5, 4, 4, stone(&reg));
        mesher.calculate_face_visibility(&world, &grid);
        mesher.boundary_check(&world, &grid);

        // Destroy one block, recompute locally.
        grid.set(5, 4, 4, Block::AIR);
        mesher.recalculate_faces_around(&world, &grid, 5, 4, 4);

        // Compare against a mesher that runs the full passes from scratch.
        let mut fresh = CullMesher::new(&reg);
        fresh.calculate_face_visibility(&world, &grid);
        fresh.boundary_check(&world, &grid);
        for y in 0..world.size_y() {
            for z in 0..world.size_z() {
                for x in 0..world.size_x() {
                    for face in ALL_FACES {
                        assert_eq!(
                            mesher.masks().is_visible(x, y, z, face),
                            fresh.masks().is_visible(x, y, z, face),
                            "mask mismatch at ({x},{y},{z}) {face:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn water_feeds_the_water_mesh() {
        let (world, mut grid, reg, mut mesher) = setup(8, 1);
        let water = reg.make_block(reg.id_by_name("water").unwrap());
        grid.set(2, 2, 2, water);
        mesher.calculate_face_visibility(&world, &grid);
        mesher.boundary_check(&world, &grid);
        let meshes = mesher.build_meshes(&world, &grid, world.chunk_coord_of(2, 2, 2));
        assert!(meshes.terrain.is_empty());
        assert_eq!(meshes.water.quad_count(), 6);
    }

    #[test]
    fn crack_tier_is_carried_into_the_terrain_mesh() {
        let (world, mut grid, reg, mut mesher) = setup(8, 1);
        let mut b = stone(&reg);
        b.health_level = 4;
        grid.set(4, 4, 4, b);
        mesher.calculate_face_visibility(&world, &grid);
        mesher.boundary_check(&world, &grid);
        let meshes = mesher.build_meshes(&world, &grid, world.chunk_coord_of(4, 4, 4));
        assert_eq!(meshes.terrain.uv[0], 4.0);
    }
}
