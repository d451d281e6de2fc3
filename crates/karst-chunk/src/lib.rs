//! Chunk metadata partition: rebuild status plus render handle, one dense
//! entry per chunk coordinate.
#![forbid(unsafe_code)]

use karst_world::ChunkCoord;

/// Per-chunk rebuild state machine.
///
/// `NotReady` is a permanent skip state for chunks that never completed
/// initial generation; the scheduler never touches them. `Ready` is
/// re-enterable: any mutation can move a chunk back to one of the two dirty
/// states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChunkStatus {
    #[default]
    NotReady,
    /// Terrain mesh only; collision untouched (cosmetic crack-tier change).
    NeedsRedraw,
    /// Terrain + water mesh and collision (voxel topology changed).
    NeedsRecreate,
    Ready,
}

impl ChunkStatus {
    #[inline]
    pub fn is_dirty(self) -> bool {
        matches!(self, ChunkStatus::NeedsRedraw | ChunkStatus::NeedsRecreate)
    }
}

/// Opaque handle to the render collaborator's per-chunk objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u32);

/// Status and render handle live in one struct so the metadata array never
/// falls out of lockstep with a parallel render table.
#[derive(Clone, Copy, Debug)]
pub struct ChunkEntry {
    pub coord: ChunkCoord,
    pub status: ChunkStatus,
    pub render: Option<RenderHandle>,
}

/// Dense 3D array of chunk entries parallel to chunk space. The world is
/// bounded, so a hash map buys nothing here.
#[derive(Clone, Debug)]
pub struct ChunkMap {
    nx: usize,
    ny: usize,
    nz: usize,
    entries: Vec<ChunkEntry>,
}

impl ChunkMap {
    /// Allocate one entry per chunk, all `NeedsRedraw` (generation marks the
    /// whole world dirty and materializes chunk by chunk).
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let mut entries = Vec::with_capacity(nx * ny * nz);
        for x in 0..nx {
            for z in 0..nz {
                for y in 0..ny {
                    entries.push(ChunkEntry {
                        coord: ChunkCoord::new(x as i32, y as i32, z as i32),
                        status: ChunkStatus::NeedsRedraw,
                        render: None,
                    });
                }
            }
        }
        Self { nx, ny, nz, entries }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, c: ChunkCoord) -> bool {
        c.cx >= 0
            && c.cy >= 0
            && c.cz >= 0
            && (c.cx as usize) < self.nx
            && (c.cy as usize) < self.ny
            && (c.cz as usize) < self.nz
    }

    // Storage order is the iteration order: x outer, z middle, y inner.
    #[inline]
    fn idx(&self, c: ChunkCoord) -> usize {
        (c.cx as usize * self.nz + c.cz as usize) * self.ny + c.cy as usize
    }

    #[inline]
    pub fn get(&self, c: ChunkCoord) -> Option<&ChunkEntry> {
        if !self.contains(c) {
            return None;
        }
        Some(&self.entries[self.idx(c)])
    }

    #[inline]
    pub fn get_mut(&mut self, c: ChunkCoord) -> Option<&mut ChunkEntry> {
        if !self.contains(c) {
            return None;
        }
        let i = self.idx(c);
        Some(&mut self.entries[i])
    }

    /// Entries in deterministic partition order (x outer, z middle, y inner),
    /// the order generation and scheduling share.
    pub fn iter(&self) -> impl Iterator<Item = &ChunkEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChunkEntry> {
        self.entries.iter_mut()
    }

    pub fn ordered_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.entries.iter().map(|e| e.coord)
    }

    pub fn count_with_status(&self, status: ChunkStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Put every entry back to one status, keeping render handles so a
    /// regeneration replaces existing meshes instead of leaking objects.
    pub fn reset_statuses(&mut self, status: ChunkStatus) {
        for e in &mut self.entries {
            e.status = status;
        }
    }
}
