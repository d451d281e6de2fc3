use karst_chunk::{ChunkMap, ChunkStatus};
use karst_world::{ChunkCoord, World};
use proptest::prelude::*;

fn dim() -> impl Strategy<Value = usize> {
    1usize..=6
}

proptest! {
    // Every coordinate appears exactly once and maps back to its own entry.
    #[test]
    fn coords_are_unique_and_addressable(nx in dim(), ny in dim(), nz in dim()) {
        let m = ChunkMap::new(nx, ny, nz);
        prop_assert_eq!(m.len(), nx * ny * nz);
        let mut seen = std::collections::HashSet::new();
        for c in m.ordered_coords() {
            prop_assert!(seen.insert(c));
            prop_assert_eq!(m.get(c).unwrap().coord, c);
        }
    }

    // The map's addressing agrees with the world's partition: the entry for
    // chunk_coord_of(block) exists for every in-bounds block coordinate.
    #[test]
    fn partition_and_map_agree(edge in 1usize..=8, nx in dim(), ny in dim(), nz in dim(),
                               fx in 0.0f64..1.0, fy in 0.0f64..1.0, fz in 0.0f64..1.0) {
        let w = World::with_chunk_size(edge, nx, ny, nz, 0);
        let m = ChunkMap::new(nx, ny, nz);
        let x = (fx * w.size_x() as f64) as i32;
        let y = (fy * w.size_y() as f64) as i32;
        let z = (fz * w.size_z() as f64) as i32;
        let c = w.chunk_coord_of(x, y, z);
        prop_assert!(m.get(c).is_some());
        // And nothing outside the partition resolves.
        prop_assert!(m.get(ChunkCoord::new(nx as i32, 0, 0)).is_none());
    }

    // Status writes land on exactly one entry.
    #[test]
    fn status_writes_are_isolated(nx in dim(), ny in dim(), nz in dim(),
                                  fx in 0.0f64..1.0, fy in 0.0f64..1.0, fz in 0.0f64..1.0) {
        let mut m = ChunkMap::new(nx, ny, nz);
        let c = ChunkCoord::new(
            (fx * nx as f64) as i32,
            (fy * ny as f64) as i32,
            (fz * nz as f64) as i32,
        );
        m.get_mut(c).unwrap().status = ChunkStatus::Ready;
        prop_assert_eq!(m.count_with_status(ChunkStatus::Ready), 1);
        prop_assert_eq!(m.count_with_status(ChunkStatus::NeedsRedraw), m.len() - 1);
    }
}
