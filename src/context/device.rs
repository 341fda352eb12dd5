//! The binding contract between the batching core and a graphics device.

use crate::color::Color;
use crate::error::DeviceError;
use crate::resource::{BufferTarget, UsageHint};
use glamx::Vec2;

/// Opaque identifier of a buffer object living on a [`GraphicsDevice`].
///
/// Devices must never hand out the same id twice, so that a stale id can't alias a newer
/// buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Wraps a raw device id.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        BufferId(raw)
    }

    /// The raw device id.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Features a device may or may not provide.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DeviceCapabilities: u32 {
        /// GPU-resident vertex buffer objects are available.
        const HARDWARE_BUFFERS = 1 << 0;
        /// Indexed draws from an element buffer are available.
        const INDEXED_DRAW = 1 << 1;
    }
}

/// Where a vertex attribute is fed to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSlot {
    /// Fixed-function vertex position.
    Position,
    /// Fixed-function texture coordinates.
    TexCoord,
    /// Fixed-function vertex color.
    Color,
    /// A shader input location, as returned by an
    /// [`AttributeResolver`](crate::context::AttributeResolver).
    Location(u32),
}

/// Scalar type of the components of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 32-bit float.
    Float32,
    /// 32-bit signed integer.
    Int32,
    /// Four normalized bytes packed into a single 32-bit word.
    PackedRgba8,
}

impl ScalarKind {
    /// Size in bytes of one component.
    #[inline]
    pub fn size_in_bytes(self) -> u32 {
        4
    }
}

/// How one attribute is read from the currently bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeFormat {
    /// Number of components per vertex.
    pub components: u32,
    /// Component type.
    pub kind: ScalarKind,
    /// Distance in bytes between two consecutive vertices.
    pub stride: u32,
    /// Byte offset of the first component inside the buffer.
    pub offset: u32,
}

/// Primitive assembly mode of a draw or of an immediate submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Isolated points.
    Points,
    /// Independent segments, two vertices each.
    Lines,
    /// Connected segments.
    LineStrip,
    /// Connected segments, closed back to the first vertex.
    LineLoop,
    /// Independent triangles, three vertices each.
    Triangles,
    /// Connected triangles sharing an edge.
    TriangleStrip,
    /// Triangles sharing the first vertex.
    TriangleFan,
    /// Independent quads, four vertices each, in fan order.
    Quads,
}

impl PrimitiveMode {
    /// The mode a backend without loops, fans or quads should draw with.
    pub fn list_mode(self) -> PrimitiveMode {
        match self {
            PrimitiveMode::LineLoop => PrimitiveMode::Lines,
            PrimitiveMode::TriangleFan | PrimitiveMode::Quads => PrimitiveMode::Triangles,
            other => other,
        }
    }

    /// Whether this mode is one of points, lists or strips.
    #[inline]
    pub fn is_list_or_strip(self) -> bool {
        self.list_mode() == self
    }

    /// Indices turning `count` vertices of this mode into [`Self::list_mode`] primitives.
    ///
    /// Returns `None` for modes that don't need any expansion. Trailing vertices that don't
    /// form a complete primitive are ignored.
    pub fn expand_to_list(self, count: u32) -> Option<Vec<u32>> {
        match self {
            PrimitiveMode::LineLoop => {
                if count < 2 {
                    return Some(Vec::new());
                }
                let mut indices = Vec::with_capacity(count as usize * 2);
                for i in 0..count {
                    indices.push(i);
                    indices.push((i + 1) % count);
                }
                Some(indices)
            }
            PrimitiveMode::TriangleFan => {
                let mut indices = Vec::with_capacity(count.saturating_sub(2) as usize * 3);
                for i in 1..count.saturating_sub(1) {
                    indices.extend_from_slice(&[0, i, i + 1]);
                }
                Some(indices)
            }
            PrimitiveMode::Quads => {
                let mut indices = Vec::with_capacity((count / 4) as usize * 6);
                for quad in 0..count / 4 {
                    let a = quad * 4;
                    indices.extend_from_slice(&[a, a + 1, a + 2, a, a + 2, a + 3]);
                }
                Some(indices)
            }
            _ => None,
        }
    }

    /// Converts to the wgpu topology of [`Self::list_mode`].
    pub fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self.list_mode() {
            PrimitiveMode::Points => wgpu::PrimitiveTopology::PointList,
            PrimitiveMode::Lines => wgpu::PrimitiveTopology::LineList,
            PrimitiveMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            _ => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

/// A device able to store buffers and draw from them.
///
/// This is the only thing the batching core needs from the graphics backend. Calls are
/// made from the thread owning the graphics context.
pub trait GraphicsDevice {
    /// Features this device supports.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Allocates a new, empty buffer object.
    fn create_buffer(&mut self, target: BufferTarget) -> Result<BufferId, DeviceError>;

    /// Replaces the whole content of `buffer` with `data`.
    ///
    /// An empty `data` is valid and leaves the buffer zero-sized.
    fn upload_buffer(
        &mut self,
        buffer: BufferId,
        data: &[u8],
        usage: UsageHint,
    ) -> Result<(), DeviceError>;

    /// Makes `buffer` the current buffer for `target`.
    fn bind_buffer(&mut self, buffer: BufferId, target: BufferTarget);

    /// Frees `buffer`. The id must not be used afterwards.
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Reads the attribute at `slot` from the currently bound array buffer.
    fn set_attribute_pointer(&mut self, slot: AttributeSlot, format: AttributeFormat);

    /// Draws `count` vertices starting at `first` from the bound array buffers.
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32);

    /// Draws `count` indices from the bound element buffer.
    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32);

    /// Starts an immediate-mode primitive.
    fn begin(&mut self, mode: PrimitiveMode);

    /// Submits one immediate-mode vertex.
    fn vertex(&mut self, position: Vec2, tex_coord: Vec2, color: Color);

    /// Ends the current immediate-mode primitive.
    fn end(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loops_close_back_to_the_first_vertex() {
        assert_eq!(
            PrimitiveMode::LineLoop.expand_to_list(3),
            Some(vec![0, 1, 1, 2, 2, 0])
        );
        assert_eq!(PrimitiveMode::LineLoop.expand_to_list(1), Some(vec![]));
    }

    #[test]
    fn fans_and_quads_become_triangles() {
        assert_eq!(
            PrimitiveMode::TriangleFan.expand_to_list(5),
            Some(vec![0, 1, 2, 0, 2, 3, 0, 3, 4])
        );
        assert_eq!(
            PrimitiveMode::Quads.expand_to_list(9),
            Some(vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7])
        );
        assert_eq!(PrimitiveMode::Quads.list_mode(), PrimitiveMode::Triangles);
    }

    #[test]
    fn lists_and_strips_are_drawn_as_is() {
        for mode in [
            PrimitiveMode::Points,
            PrimitiveMode::Lines,
            PrimitiveMode::LineStrip,
            PrimitiveMode::Triangles,
            PrimitiveMode::TriangleStrip,
        ] {
            assert!(mode.is_list_or_strip());
            assert_eq!(mode.expand_to_list(6), None);
        }
        assert_eq!(
            PrimitiveMode::TriangleFan.to_wgpu(),
            wgpu::PrimitiveTopology::TriangleList
        );
    }
}
