//! Persistence seam: the saved-world value types, the store trait, and the
//! bincode-on-disk implementation.
#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use karst_blocks::Block;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedPlayer {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

/// Complete persisted world: dimensions, the grid verbatim, and the player
/// transform for the consuming game loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedWorld {
    pub chunk_size: u32,
    pub chunks_x: u32,
    pub chunks_y: u32,
    pub chunks_z: u32,
    pub seed: i32,
    pub blocks: Vec<Block>,
    pub player: SavedPlayer,
}

impl SavedWorld {
    /// Payload/dimension consistency; a mismatch means the file was not
    /// written by us or was truncated.
    pub fn validate(&self) -> Result<(), StoreError> {
        let volume = self.chunk_size as usize * self.chunks_x as usize
            * self.chunk_size as usize
            * self.chunks_y as usize
            * self.chunk_size as usize
            * self.chunks_z as usize;
        if self.blocks.len() != volume {
            return Err(StoreError::Corrupt(format!(
                "block payload holds {} entries, dimensions demand {}",
                self.blocks.len(),
                volume
            )));
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("corrupt save: {0}")]
    Corrupt(String),
    #[error("no saved world")]
    Missing,
}

/// Persistence collaborator consumed by the Load pipeline; the save side is
/// symmetric.
pub trait WorldStore {
    fn load(&self) -> Result<SavedWorld, StoreError>;
    fn save(&self, world: &SavedWorld) -> Result<(), StoreError>;
}

/// Bincode-encoded single-file store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WorldStore for FileStore {
    fn load(&self) -> Result<SavedWorld, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::Missing);
        }
        let bytes = fs::read(&self.path)?;
        let world: SavedWorld = bincode::deserialize(&bytes)?;
        world.validate()?;
        log::info!(
            "loaded world {}x{}x{} chunks from {}",
            world.chunks_x,
            world.chunks_y,
            world.chunks_z,
            self.path.display()
        );
        Ok(world)
    }

    fn save(&self, world: &SavedWorld) -> Result<(), StoreError> {
        world.validate()?;
        let bytes = bincode::serialize(world)?;
        fs::write(&self.path, &bytes)?;
        log::info!("saved world to {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }
}

/// In-memory store; the test double and the model for other backends.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<SavedWorld>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_world(world: SavedWorld) -> Self {
        Self {
            slot: Mutex::new(Some(world)),
        }
    }
}

impl WorldStore for MemoryStore {
    fn load(&self) -> Result<SavedWorld, StoreError> {
        self.slot
            .lock()
            .expect("store poisoned")
            .clone()
            .ok_or(StoreError::Missing)
    }

    fn save(&self, world: &SavedWorld) -> Result<(), StoreError> {
        world.validate()?;
        *self.slot.lock().expect("store poisoned") = Some(world.clone());
        Ok(())
    }
}
