use serde::{Deserialize, Serialize};

pub type BlockId = u16;

/// Runtime voxel value stored in the world grid.
///
/// `health_level` is the discretized crack tier (0 = pristine) used for the
/// damage overlay; it only changes when the tier changes, so repeated hits
/// inside one tier do not force a remesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub hit_points: u8,
    pub health_level: u8,
}

impl Block {
    /// Air is always id 0 with no hit points. Destroyed blocks revert to this
    /// value rather than being removed from the grid.
    pub const AIR: Block = Block {
        id: 0,
        hit_points: 0,
        health_level: 0,
    };

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == Block::AIR.id
    }
}
