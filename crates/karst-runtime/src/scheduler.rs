use karst_chunk::ChunkStatus;
use karst_mesh::Mesher;
use karst_render::RenderSink;
use karst_world::GenerationStatus;

use crate::state::WorldState;

/// One scheduling pass: turn every dirty chunk back into `Ready`.
///
/// Runs once per host tick, after that tick's mutations, and does not
/// suspend internally: per-tick dirty counts are small next to a full-world
/// generation. Recreated chunks get a fresh terrain+water pair and a new
/// collider; redrawn chunks get only a fresh terrain mesh because nothing
/// moved in the topology. Returns the number of chunks rebuilt.
pub fn rebuild_dirty_chunks(
    state: &mut WorldState,
    mesher: &dyn Mesher,
    render: &mut dyn RenderSink,
) -> usize {
    if state.status < GenerationStatus::FacesReady {
        log::debug!("rebuild requested before faces are ready; skipping");
        return 0;
    }
    let WorldState {
        world,
        grid,
        chunks,
        ..
    } = state;
    let Some(chunks) = chunks.as_mut() else {
        return 0;
    };
    let mut rebuilt = 0usize;
    for entry in chunks.iter_mut() {
        match entry.status {
            ChunkStatus::NotReady | ChunkStatus::Ready => continue,
            ChunkStatus::NeedsRecreate => {
                let meshes = mesher.build_meshes(world, grid, entry.coord);
                match entry.render {
                    Some(h) => render.replace_chunk_meshes(h, &meshes),
                    None => {
                        entry.render =
                            Some(render.create_chunk_objects(world.origin_of(entry.coord), &meshes));
                    }
                }
            }
            ChunkStatus::NeedsRedraw => {
                let terrain = mesher.build_terrain_mesh(world, grid, entry.coord);
                match entry.render {
                    Some(h) => render.replace_terrain_mesh(h, &terrain),
                    None => {
                        // A redraw without render objects only happens if a
                        // chunk got dirtied before ever materializing; fall
                        // back to a full create.
                        let meshes = mesher.build_meshes(world, grid, entry.coord);
                        entry.render =
                            Some(render.create_chunk_objects(world.origin_of(entry.coord), &meshes));
                    }
                }
            }
        }
        entry.status = ChunkStatus::Ready;
        rebuilt += 1;
    }
    if rebuilt > 0 {
        log::debug!("rebuilt {rebuilt} dirty chunk(s)");
    }
    rebuilt
}
