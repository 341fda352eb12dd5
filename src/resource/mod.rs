//! CPU-side geometry accumulators and the GPU buffers they upload to.

pub use crate::resource::batch::Batch;
pub use crate::resource::gpu_buffer::{
    BufferAccess, BufferTarget, GpuBuffer, UpdateFrequency, UsageHint,
};
pub use crate::resource::index_buffer::{IndexBuffer, VertexIndex, VERTEX_INDEX_FORMAT};
pub use crate::resource::indexed_mesh::{IndexedMesh, MeshCounts};
pub use crate::resource::settings::{BatchSettings, StoreSettings};
pub use crate::resource::vertex_layout::{VertexAttribute, VertexLayout, COMPONENT_SIZE};
pub use crate::resource::vertex_store::{CornerColors, DynamicVertexStore};

mod batch;
mod gpu_buffer;
mod index_buffer;
mod indexed_mesh;
mod settings;
mod vertex_layout;
mod vertex_store;
