//! Element buffer accumulated on the CPU.

use crate::context::{Context, GraphicsDevice};
use crate::error::Result;
use crate::resource::{BufferTarget, GpuBuffer, UsageHint};

/// Integer type of the indices of an [`IndexBuffer`].
pub type VertexIndex = u32;
/// The wgpu index format of [`VertexIndex`].
pub const VERTEX_INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

/// Indices accumulated for one upload, and the element buffer they are uploaded to.
pub struct IndexBuffer {
    indices: Vec<VertexIndex>,
    buffer: GpuBuffer,
    uploaded: usize,
}

impl IndexBuffer {
    /// Creates an empty index buffer and acquires its element buffer.
    pub fn new<D: GraphicsDevice>(ctxt: &mut Context<D>, usage: UsageHint) -> Result<Self> {
        Ok(IndexBuffer {
            indices: Vec::new(),
            buffer: GpuBuffer::new(ctxt, BufferTarget::ElementArray, usage)?,
            uploaded: 0,
        })
    }

    /// Indices written since the last update or clear.
    #[inline]
    pub fn indices(&self) -> &[VertexIndex] {
        &self.indices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of indices sent by the last successful [`Self::update`].
    #[inline]
    pub fn uploaded(&self) -> usize {
        self.uploaded
    }

    #[inline]
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    #[inline]
    pub fn push(&mut self, index: VertexIndex) {
        self.indices.push(index);
    }

    /// Appends one triangle.
    #[inline]
    pub fn push_triangle(&mut self, a: VertexIndex, b: VertexIndex, c: VertexIndex) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Forgets the written indices, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Uploads the written indices and starts a new batch. Returns the number uploaded.
    pub fn update<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) -> Result<usize> {
        let count = self.indices.len();
        let result = self.buffer.upload(ctxt, &self.indices);
        self.indices.clear();

        result?;
        self.uploaded = count;
        Ok(count)
    }

    /// Binds the element buffer. Returns `false` if it was released.
    pub fn bind<D: GraphicsDevice>(&self, ctxt: &mut Context<D>) -> bool {
        !self.buffer.is_released() && self.buffer.bind(ctxt)
    }

    /// Gives the element buffer back to the device.
    pub fn release<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) {
        self.buffer.release(ctxt);
    }
}

impl Extend<VertexIndex> for IndexBuffer {
    fn extend<I: IntoIterator<Item = VertexIndex>>(&mut self, iter: I) {
        self.indices.extend(iter);
    }
}
