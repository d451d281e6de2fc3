use karst_blocks::Block;

/// Dense world-sized voxel array, indexed `(y * sz + z) * sx + x`.
///
/// Single-writer: the world state owns the grid and mutates it in place so
/// every reader sees changes immediately. The hot-path accessors do not
/// validate bounds (callers come through the world's coordinate helpers);
/// [`BlockGrid::get_checked`] is the validated boundary accessor.
#[derive(Clone, Debug)]
pub struct BlockGrid {
    sx: usize,
    sy: usize,
    sz: usize,
    blocks: Vec<Block>,
}

impl BlockGrid {
    /// Fresh grid with every block set to air.
    pub fn allocate(sx: usize, sy: usize, sz: usize) -> Self {
        Self {
            sx,
            sy,
            sz,
            blocks: vec![Block::AIR; sx * sy * sz],
        }
    }

    /// Rebuild a grid from saved contents. Short payloads are padded with air
    /// rather than rejected, matching how truncated chunk buffers are healed.
    pub fn from_blocks(sx: usize, sy: usize, sz: usize, blocks: Vec<Block>) -> Self {
        let mut b = blocks;
        b.resize(sx * sy * sz, Block::AIR);
        Self { sx, sy, sz, blocks: b }
    }

    /// Reset every block to air, keeping the allocation.
    pub fn reset(&mut self) {
        self.blocks.fill(Block::AIR);
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.sx
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.sy
    }

    #[inline]
    pub fn size_z(&self) -> usize {
        self.sz
    }

    #[inline]
    fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        debug_assert!(x < self.sx && y < self.sy && z < self.sz);
        self.blocks[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, b: Block) {
        debug_assert!(x < self.sx && y < self.sy && z < self.sz);
        let i = self.idx(x, y, z);
        self.blocks[i] = b;
    }

    /// Validated accessor for signed world coordinates.
    #[inline]
    pub fn get_checked(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= self.sx || y >= self.sy || z >= self.sz {
            return None;
        }
        Some(self.get(x, y, z))
    }

    #[inline]
    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        self.blocks.iter().all(|b| b.is_air())
    }
}
