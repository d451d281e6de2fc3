use thiserror::Error;

use karst_blocks::{BlockId, BlockRegistry};
use karst_chunk::{ChunkMap, ChunkStatus};
use karst_io::{SavedPlayer, StoreError, WorldStore};
use karst_mesh::Mesher;
use karst_render::RenderSink;
use karst_world::{BlockGrid, ChunkCoord, GenerationStatus, TerrainSource, World};

use crate::progress::Progress;
use crate::state::WorldState;

/// The collaborator seams a pipeline run draws on. Create ignores `store`,
/// Load ignores `terrain`.
pub struct Collaborators<'a> {
    pub reg: &'a BlockRegistry,
    pub terrain: &'a mut dyn TerrainSource,
    pub mesher: &'a mut dyn Mesher,
    pub render: &'a mut dyn RenderSink,
    pub store: &'a dyn WorldStore,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A second Create/Load was started while one is in flight. The source
    /// engine left this a silent race; here it is an explicit error.
    #[error("a generation pipeline is already in flight")]
    AlreadyRunning,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    InProgress,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Create,
    Load,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Reset,
    /// Load only: dims, grid, and player restored verbatim from the store.
    FetchSaved,
    Heights,
    BlockTypes,
    Scatter,
    Water,
    Trees,
    AllocateChunks,
    FaceVisibility,
    BoundaryPass,
    /// Yields after every single chunk so a large world never blocks the
    /// host frame loop for the whole remeshing pass.
    Materialize,
    Done,
}

const CREATE_COARSE_STAGES: usize = 9;
const LOAD_COARSE_STAGES: usize = 5;

/// Cooperative staged pipeline: the host calls [`Pipeline::step`] once per
/// tick until it reports `Finished`. There is no cancellation; a run either
/// completes or fails, and on failure the global status stays wherever it
/// last got promoted.
pub struct Pipeline {
    kind: Kind,
    stage: Stage,
    water: bool,
    tree_probability: f32,
    heights: Vec<f32>,
    flat_types: Vec<BlockId>,
    order: Vec<ChunkCoord>,
    cursor: usize,
    progress: Progress,
    player: Option<SavedPlayer>,
}

impl Pipeline {
    /// Fresh-world pipeline. Fails if another run is already in flight.
    pub fn create(
        state: &mut WorldState,
        water: bool,
        tree_probability: f32,
    ) -> Result<Self, PipelineError> {
        if state.pipeline_active {
            return Err(PipelineError::AlreadyRunning);
        }
        state.pipeline_active = true;
        Ok(Self {
            kind: Kind::Create,
            stage: Stage::Reset,
            water,
            tree_probability,
            heights: Vec::new(),
            flat_types: Vec::new(),
            order: Vec::new(),
            cursor: 0,
            progress: Progress::for_run(state.world.chunk_count(), CREATE_COARSE_STAGES),
            player: None,
        })
    }

    /// Saved-world pipeline. The grid is restored verbatim; no terrain or
    /// tree generation runs.
    pub fn load(state: &mut WorldState) -> Result<Self, PipelineError> {
        if state.pipeline_active {
            return Err(PipelineError::AlreadyRunning);
        }
        state.pipeline_active = true;
        Ok(Self {
            kind: Kind::Load,
            stage: Stage::Reset,
            water: false,
            tree_probability: 0.0,
            heights: Vec::new(),
            flat_types: Vec::new(),
            order: Vec::new(),
            cursor: 0,
            // Provisional until the save reveals the real dimensions.
            progress: Progress::for_run(state.world.chunk_count(), LOAD_COARSE_STAGES),
            player: None,
        })
    }

    #[inline]
    pub fn ratio(&self) -> f32 {
        self.progress.ratio()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Player transform restored by a Load run, once it has fetched.
    #[inline]
    pub fn player(&self) -> Option<SavedPlayer> {
        self.player
    }

    /// Advance by one stage, or by one chunk inside the materialization
    /// stage. A store failure aborts the run (no rollback): the status stays
    /// at its last promoted value and the guard clears so a whole new run
    /// can be retried.
    pub fn step(
        &mut self,
        state: &mut WorldState,
        c: &mut Collaborators<'_>,
    ) -> Result<StepStatus, PipelineError> {
        match self.stage {
            Stage::Reset => {
                state.status = GenerationStatus::NotReady;
                match self.kind {
                    Kind::Create => {
                        state.grid = BlockGrid::allocate(
                            state.world.size_x(),
                            state.world.size_y(),
                            state.world.size_z(),
                        );
                        self.progress.coarse_step();
                        self.stage = Stage::Heights;
                    }
                    // Load progress is counted from the fetch on, once the
                    // save has fixed the real dimensions; counting against
                    // the provisional totals here could move the ratio
                    // backwards when they get replaced.
                    Kind::Load => self.stage = Stage::FetchSaved,
                }
            }
            Stage::FetchSaved => {
                let saved = match c.store.load() {
                    Ok(s) => s,
                    Err(e) => {
                        state.pipeline_active = false;
                        return Err(e.into());
                    }
                };
                state.world = World::with_chunk_size(
                    saved.chunk_size as usize,
                    saved.chunks_x as usize,
                    saved.chunks_y as usize,
                    saved.chunks_z as usize,
                    saved.seed,
                );
                state.grid = BlockGrid::from_blocks(
                    state.world.size_x(),
                    state.world.size_y(),
                    state.world.size_z(),
                    saved.blocks,
                );
                self.player = Some(saved.player);
                state.status = GenerationStatus::TerrainReady;
                // Real totals now that the save fixed the dimensions; the
                // two stages already behind us are re-counted.
                self.progress = Progress::for_run(state.world.chunk_count(), LOAD_COARSE_STAGES);
                self.progress.coarse_step();
                self.progress.coarse_step();
                log::info!(
                    "restored {}x{}x{} chunk world, terrain ready",
                    state.world.chunks_x,
                    state.world.chunks_y,
                    state.world.chunks_z
                );
                self.stage = Stage::AllocateChunks;
            }
            Stage::Heights => {
                self.heights = c.terrain.heights(state.world.size_x(), state.world.size_z());
                self.progress.coarse_step();
                self.stage = Stage::BlockTypes;
            }
            Stage::BlockTypes => {
                self.flat_types = c.terrain.block_types(&state.world, &self.heights);
                self.progress.coarse_step();
                self.stage = Stage::Scatter;
            }
            Stage::Scatter => {
                // Deflattenize: the terrain collaborator works on a flat
                // array; scatter it back into 3D writes, each block spawned
                // at full health.
                for (i, id) in self.flat_types.iter().enumerate() {
                    let (x, y, z) = state.world.deflatten_index(i);
                    state.grid.set(x, y, z, c.reg.make_block(*id));
                }
                self.heights = Vec::new();
                self.flat_types = Vec::new();
                state.status = GenerationStatus::TerrainReady;
                log::info!("terrain scattered into the grid, terrain ready");
                self.progress.coarse_step();
                self.stage = Stage::Water;
            }
            Stage::Water => {
                if self.water {
                    c.terrain.add_water(&state.world, &mut state.grid);
                }
                self.progress.coarse_step();
                self.stage = Stage::Trees;
            }
            Stage::Trees => {
                c.terrain
                    .add_trees(&state.world, &mut state.grid, self.tree_probability);
                self.progress.coarse_step();
                self.stage = Stage::AllocateChunks;
            }
            Stage::AllocateChunks => {
                let dims = (
                    state.world.chunks_x,
                    state.world.chunks_y,
                    state.world.chunks_z,
                );
                match state.chunks.as_mut() {
                    // Keep existing entries so render handles survive and a
                    // regeneration replaces meshes instead of leaking them.
                    Some(m) if m.dims() == dims => m.reset_statuses(ChunkStatus::NeedsRedraw),
                    _ => state.chunks = Some(ChunkMap::new(dims.0, dims.1, dims.2)),
                }
                self.order = state
                    .chunks
                    .as_ref()
                    .map(|m| m.ordered_coords().collect())
                    .unwrap_or_default();
                self.cursor = 0;
                self.progress.coarse_step();
                self.stage = Stage::FaceVisibility;
            }
            Stage::FaceVisibility => {
                c.mesher.calculate_face_visibility(&state.world, &state.grid);
                self.progress.coarse_step();
                self.stage = Stage::BoundaryPass;
            }
            Stage::BoundaryPass => {
                c.mesher.boundary_check(&state.world, &state.grid);
                state.status = GenerationStatus::FacesReady;
                log::info!("face masks complete, faces ready");
                self.progress.coarse_step();
                self.stage = Stage::Materialize;
            }
            Stage::Materialize => {
                if let Some(coord) = self.order.get(self.cursor).copied() {
                    let meshes = c.mesher.build_meshes(&state.world, &state.grid, coord);
                    let origin = state.world.origin_of(coord);
                    if let Some(entry) =
                        state.chunks.as_mut().and_then(|m| m.get_mut(coord))
                    {
                        match entry.render {
                            Some(h) => c.render.replace_chunk_meshes(h, &meshes),
                            None => {
                                entry.render = Some(c.render.create_chunk_objects(origin, &meshes));
                            }
                        }
                        entry.status = ChunkStatus::Ready;
                    } else {
                        log::warn!("materialization hit a missing chunk entry at {coord:?}");
                    }
                    self.cursor += 1;
                    self.progress.chunk_step();
                }
                if self.cursor >= self.order.len() {
                    state.status = GenerationStatus::AllReady;
                    state.pipeline_active = false;
                    self.stage = Stage::Done;
                    log::info!("world all ready ({} chunks materialized)", self.order.len());
                    return Ok(StepStatus::Finished);
                }
            }
            Stage::Done => return Ok(StepStatus::Finished),
        }
        Ok(StepStatus::InProgress)
    }
}
