use karst_chunk::ChunkMap;
use karst_world::{BlockGrid, GenerationStatus, World};

/// Everything the host loop owns: dimensions, the dense grid, the chunk
/// metadata (allocated by the first pipeline run), and the coarse readiness
/// status.
///
/// Single-threaded discipline: within a tick, mutations run first and the
/// scheduler after; nothing here is synchronized because nothing runs
/// concurrently.
pub struct WorldState {
    pub world: World,
    pub grid: BlockGrid,
    pub chunks: Option<ChunkMap>,
    pub status: GenerationStatus,
    /// Reentrancy guard: set while a pipeline run is in flight so a second
    /// Create/Load cannot start over it.
    pub(crate) pipeline_active: bool,
}

impl WorldState {
    pub fn new(world: World) -> Self {
        let grid = BlockGrid::allocate(world.size_x(), world.size_y(), world.size_z());
        Self {
            world,
            grid,
            chunks: None,
            status: GenerationStatus::NotReady,
            pipeline_active: false,
        }
    }

    #[inline]
    pub fn is_pipeline_active(&self) -> bool {
        self.pipeline_active
    }

    /// A world is only usable once a pipeline run has promoted it all the
    /// way; anything less means generation failed or never ran.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.status == GenerationStatus::AllReady
    }
}
