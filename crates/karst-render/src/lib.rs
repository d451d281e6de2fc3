//! Render seam: the sink trait the core hands finished meshes to, plus a
//! headless CPU-resident sink. GPU upload lives behind this boundary and is
//! out of scope for the engine core.
#![forbid(unsafe_code)]

use hashbrown::HashMap;

use karst_chunk::RenderHandle;
use karst_mesh::{ChunkMeshes, MeshData};

/// Render collaborator. Every path except [`RenderSink::replace_terrain_mesh`]
/// also assigns the terrain mesh to the physics-collision shape; the
/// terrain-only path exists because collider rebuilds are expensive and
/// cosmetic crack changes do not move topology.
pub trait RenderSink {
    /// First materialization of a chunk; returns the handle stored in the
    /// chunk's metadata entry.
    fn create_chunk_objects(&mut self, origin: (i32, i32, i32), meshes: &ChunkMeshes)
    -> RenderHandle;

    /// Recreate path: terrain, water, and collision all replaced.
    fn replace_chunk_meshes(&mut self, handle: RenderHandle, meshes: &ChunkMeshes);

    /// Redraw path: render geometry only; water and collider untouched.
    fn replace_terrain_mesh(&mut self, handle: RenderHandle, terrain: &MeshData);
}

/// What the headless sink keeps per chunk: the meshes as uploaded plus the
/// collision copy of the terrain mesh.
#[derive(Clone, Debug)]
pub struct ChunkRenderObject {
    pub origin: (i32, i32, i32),
    pub terrain: MeshData,
    pub water: MeshData,
    pub collider: MeshData,
}

/// CPU-resident sink standing where a GPU uploader would. Tests read it back
/// to observe the redraw/recreate asymmetry (a redraw leaves the collider
/// stale on purpose).
#[derive(Default)]
pub struct HeadlessRender {
    objects: HashMap<RenderHandle, ChunkRenderObject>,
    next: u32,
}

impl HeadlessRender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&self, handle: RenderHandle) -> Option<&ChunkRenderObject> {
        self.objects.get(&handle)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn total_terrain_quads(&self) -> usize {
        self.objects.values().map(|o| o.terrain.quad_count()).sum()
    }

    pub fn total_water_quads(&self) -> usize {
        self.objects.values().map(|o| o.water.quad_count()).sum()
    }
}

impl RenderSink for HeadlessRender {
    fn create_chunk_objects(
        &mut self,
        origin: (i32, i32, i32),
        meshes: &ChunkMeshes,
    ) -> RenderHandle {
        let handle = RenderHandle(self.next);
        self.next += 1;
        self.objects.insert(
            handle,
            ChunkRenderObject {
                origin,
                terrain: meshes.terrain.clone(),
                water: meshes.water.clone(),
                collider: meshes.terrain.clone(),
            },
        );
        handle
    }

    fn replace_chunk_meshes(&mut self, handle: RenderHandle, meshes: &ChunkMeshes) {
        let Some(obj) = self.objects.get_mut(&handle) else {
            log::warn!("replace_chunk_meshes on unknown handle {handle:?}");
            return;
        };
        obj.terrain = meshes.terrain.clone();
        obj.water = meshes.water.clone();
        obj.collider = meshes.terrain.clone();
    }

    fn replace_terrain_mesh(&mut self, handle: RenderHandle, terrain: &MeshData) {
        let Some(obj) = self.objects.get_mut(&handle) else {
            log::warn!("replace_terrain_mesh on unknown handle {handle:?}");
            return;
        };
        obj.terrain = terrain.clone();
    }
}
