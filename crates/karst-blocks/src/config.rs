use serde::Deserialize;

/// On-disk shape of `blocks.toml`.
#[derive(Deserialize)]
pub struct BlocksConfig {
    /// Number of distinct crack-overlay tiers available to the renderer.
    pub crack_levels: Option<u8>,
    pub blocks: Vec<BlockDefConfig>,
}

#[derive(Deserialize)]
pub struct BlockDefConfig {
    pub name: String,
    /// Fixed id; rows without one are assigned the next free slot in order.
    pub id: Option<u16>,
    pub solid: Option<bool>,
    pub max_hit_points: Option<u8>,
}
