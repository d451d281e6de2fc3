mod common;

use common::FlatTerrain;
use karst_blocks::BlockRegistry;
use karst_chunk::ChunkStatus;
use karst_io::MemoryStore;
use karst_mesh::{ChunkMeshes, CullMesher, MeshData, Mesher};
use karst_render::HeadlessRender;
use karst_runtime::{Collaborators, Pipeline, StepStatus, WorldState, rebuild_dirty_chunks};
use karst_world::{BlockGrid, ChunkCoord, GenerationStatus, World};

fn generated_world(
    reg: &BlockRegistry,
    chunks: usize,
    floor_layers: usize,
) -> (WorldState, CullMesher, HeadlessRender) {
    let mut state = WorldState::new(World::with_chunk_size(4, chunks, 1, chunks, 3));
    let mut terrain = FlatTerrain::new(reg, floor_layers);
    let mut mesher = CullMesher::new(reg);
    let mut render = HeadlessRender::new();
    let store = MemoryStore::new();
    let mut pipeline = Pipeline::create(&mut state, false, 0.0).unwrap();
    let mut c = Collaborators {
        reg,
        terrain: &mut terrain,
        mesher: &mut mesher,
        render: &mut render,
        store: &store,
    };
    while pipeline.step(&mut state, &mut c).unwrap() == StepStatus::InProgress {}
    (state, mesher, render)
}

#[test]
fn destroyed_block_recreates_its_chunk() {
    let reg = BlockRegistry::with_defaults();
    let (mut state, mut mesher, mut render) = generated_world(&reg, 1, 2);
    let coord = ChunkCoord::new(0, 0, 0);
    let quads_before = render.total_terrain_quads();

    // Mine the surface block at (1, 1, 1) to destruction.
    let max = reg.max_hit_points(state.grid.get(1, 1, 1).id);
    let mut destroyed = false;
    for _ in 0..max {
        destroyed = karst_edit::hit_block(
            &state.world,
            &mut state.grid,
            state.chunks.as_mut().unwrap(),
            &mut mesher,
            &reg,
            1,
            1,
            1,
        );
    }
    assert!(destroyed);
    assert_eq!(
        state.chunks.as_ref().unwrap().get(coord).unwrap().status,
        ChunkStatus::NeedsRecreate
    );

    let rebuilt = rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    assert_eq!(rebuilt, 1);
    let entry = state.chunks.as_ref().unwrap().get(coord).unwrap();
    assert_eq!(entry.status, ChunkStatus::Ready);
    // Topology changed: render geometry moved and the collider followed it.
    let obj = render.object(entry.render.unwrap()).unwrap();
    assert_ne!(render.total_terrain_quads(), quads_before);
    assert_eq!(obj.collider.quad_count(), obj.terrain.quad_count());
    assert_eq!(obj.collider.pos, obj.terrain.pos);
}

#[test]
fn crack_change_redraws_without_touching_the_collider() {
    let reg = BlockRegistry::with_defaults();
    let (mut state, mut mesher, mut render) = generated_world(&reg, 1, 2);
    let coord = ChunkCoord::new(0, 0, 0);
    let collider_before = render
        .object(state.chunks.as_ref().unwrap().get(coord).unwrap().render.unwrap())
        .unwrap()
        .collider
        .clone();

    // One hit on a 10-point stone block: tier 0 -> 1, no destruction.
    assert!(!karst_edit::hit_block(
        &state.world,
        &mut state.grid,
        state.chunks.as_mut().unwrap(),
        &mut mesher,
        &reg,
        1,
        1,
        1,
    ));
    assert_eq!(
        state.chunks.as_ref().unwrap().get(coord).unwrap().status,
        ChunkStatus::NeedsRedraw
    );

    let rebuilt = rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    assert_eq!(rebuilt, 1);
    let entry = state.chunks.as_ref().unwrap().get(coord).unwrap();
    assert_eq!(entry.status, ChunkStatus::Ready);
    let obj = render.object(entry.render.unwrap()).unwrap();
    // The crack tier moved into the terrain UVs but the collider is the one
    // from before the redraw.
    assert_eq!(obj.collider.pos, collider_before.pos);
    assert_eq!(obj.collider.uv, collider_before.uv);
    assert_ne!(obj.terrain.uv, collider_before.uv);
}

#[test]
fn redraw_requests_only_a_terrain_mesh() {
    use std::cell::RefCell;

    // Records which build entry points the scheduler uses; the scheduler
    // holds the mesher by shared reference, so counts go through cells.
    struct CellMesher {
        pair_builds: RefCell<Vec<ChunkCoord>>,
        terrain_builds: RefCell<Vec<ChunkCoord>>,
    }
    impl Mesher for CellMesher {
        fn calculate_face_visibility(&mut self, _world: &World, _grid: &BlockGrid) {}
        fn boundary_check(&mut self, _world: &World, _grid: &BlockGrid) {}
        fn recalculate_faces_around(
            &mut self,
            _w: &World,
            _g: &BlockGrid,
            _x: i32,
            _y: i32,
            _z: i32,
        ) {
        }
        fn build_meshes(&self, _world: &World, _grid: &BlockGrid, coord: ChunkCoord) -> ChunkMeshes {
            self.pair_builds.borrow_mut().push(coord);
            ChunkMeshes::default()
        }
        fn build_terrain_mesh(&self, _world: &World, _grid: &BlockGrid, coord: ChunkCoord) -> MeshData {
            self.terrain_builds.borrow_mut().push(coord);
            MeshData::default()
        }
    }

    let reg = BlockRegistry::with_defaults();
    let (mut state, _mesher, mut render) = generated_world(&reg, 2, 2);
    let mesher = CellMesher {
        pair_builds: RefCell::new(Vec::new()),
        terrain_builds: RefCell::new(Vec::new()),
    };

    let redraw = ChunkCoord::new(0, 0, 0);
    let recreate = ChunkCoord::new(1, 0, 1);
    {
        let chunks = state.chunks.as_mut().unwrap();
        chunks.get_mut(redraw).unwrap().status = ChunkStatus::NeedsRedraw;
        chunks.get_mut(recreate).unwrap().status = ChunkStatus::NeedsRecreate;
    }

    let rebuilt = rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    assert_eq!(rebuilt, 2);
    assert_eq!(&*mesher.terrain_builds.borrow(), &[redraw]);
    assert_eq!(&*mesher.pair_builds.borrow(), &[recreate]);
}

#[test]
fn not_ready_chunks_are_skipped_forever() {
    let reg = BlockRegistry::with_defaults();
    let (mut state, mesher, mut render) = generated_world(&reg, 2, 2);
    let frozen = ChunkCoord::new(0, 0, 1);
    {
        let chunks = state.chunks.as_mut().unwrap();
        chunks.get_mut(frozen).unwrap().status = ChunkStatus::NotReady;
        chunks.get_mut(ChunkCoord::new(1, 0, 0)).unwrap().status = ChunkStatus::NeedsRecreate;
    }
    let rebuilt = rebuild_dirty_chunks(&mut state, &mesher, &mut render);
    assert_eq!(rebuilt, 1);
    assert_eq!(
        state.chunks.as_ref().unwrap().get(frozen).unwrap().status,
        ChunkStatus::NotReady
    );
}

#[test]
fn scheduler_noops_before_faces_are_ready() {
    let reg = BlockRegistry::with_defaults();
    let (mut state, mesher, mut render) = generated_world(&reg, 1, 2);
    state.chunks.as_mut().unwrap().reset_statuses(ChunkStatus::NeedsRecreate);
    state.status = GenerationStatus::TerrainReady;
    assert_eq!(rebuild_dirty_chunks(&mut state, &mesher, &mut render), 0);
    assert_eq!(
        state
            .chunks
            .as_ref()
            .unwrap()
            .count_with_status(ChunkStatus::NeedsRecreate),
        state.chunks.as_ref().unwrap().len()
    );
}

#[test]
fn ready_world_needs_no_rebuilds() {
    let reg = BlockRegistry::with_defaults();
    let (mut state, mesher, mut render) = generated_world(&reg, 2, 2);
    assert_eq!(rebuild_dirty_chunks(&mut state, &mesher, &mut render), 0);
}
