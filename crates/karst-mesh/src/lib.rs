//! Face-visibility masks, CPU mesh data, and the meshing seam.
#![forbid(unsafe_code)]

pub mod data;
pub mod face;
pub mod masks;
pub mod mesher;

pub use data::{ChunkMeshes, MeshData};
pub use face::Face;
pub use masks::FaceMasks;
pub use mesher::{CullMesher, Mesher};
