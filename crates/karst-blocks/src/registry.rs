use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::BlocksConfig;
use super::types::{Block, BlockId};

const DEFAULT_BLOCKS_TOML: &str = include_str!("../assets/blocks.toml");

/// Fallback crack tier count when the config omits it.
pub const DEFAULT_CRACK_LEVELS: u8 = 11;

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub max_hit_points: u8,
}

#[derive(Default, Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub crack_levels: u8,
}

impl BlockRegistry {
    /// Registry built from the embedded default table.
    pub fn with_defaults() -> Self {
        // The embedded table is fixed at compile time; a parse failure there
        // is a packaging bug, so surface it loudly.
        Self::from_toml_str(DEFAULT_BLOCKS_TOML).expect("embedded blocks.toml is valid")
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry {
            blocks: Vec::new(),
            by_name: HashMap::new(),
            crack_levels: cfg.crack_levels.unwrap_or(DEFAULT_CRACK_LEVELS),
        };
        for def in cfg.blocks.into_iter() {
            let id = def.id.unwrap_or(reg.blocks.len() as u16);
            if reg.blocks.iter().any(|b| b.id == id) {
                return Err(format!("duplicate block id {} ({})", id, def.name).into());
            }
            if reg.by_name.contains_key(&def.name) {
                return Err(format!("duplicate block name {}", def.name).into());
            }
            reg.by_name.insert(def.name.clone(), id);
            reg.blocks.push(BlockType {
                id,
                name: def.name,
                solid: def.solid.unwrap_or(true),
                max_hit_points: def.max_hit_points.unwrap_or(1),
            });
        }
        // Air anchors the whole damage model: id 0, never damageable.
        match reg.blocks.iter().find(|b| b.id == 0) {
            Some(air) if air.max_hit_points == 0 && !air.solid => {}
            Some(_) => return Err("block id 0 must be non-solid with 0 hit points".into()),
            None => return Err("config defines no block with id 0 (air)".into()),
        }
        reg.blocks.sort_by_key(|b| b.id);
        Ok(reg)
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    /// Max hit points for a type; unknown ids resolve to 0 (treated as air).
    #[inline]
    pub fn max_hit_points(&self, id: BlockId) -> u8 {
        self.get(id).map(|b| b.max_hit_points).unwrap_or(0)
    }

    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.get(id).map(|b| b.solid).unwrap_or(false)
    }

    /// Fresh full-health block of the given type.
    pub fn make_block(&self, id: BlockId) -> Block {
        Block {
            id,
            hit_points: self.max_hit_points(id),
            health_level: 0,
        }
    }
}
