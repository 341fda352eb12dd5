//! Vertex store paired with an index buffer.

use glamx::Vec2;

use crate::color::Color;
use crate::context::{Context, GraphicsDevice};
use crate::error::Result;
use crate::geometry::Rect;
use crate::resource::{
    CornerColors, DynamicVertexStore, IndexBuffer, StoreSettings, VertexIndex, VertexLayout,
};

/// Sizes uploaded by [`IndexedMesh::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshCounts {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of indices.
    pub indices: usize,
}

/// Geometry drawn with indexed draws: shared vertices, triangles as index triples.
pub struct IndexedMesh {
    vertices: DynamicVertexStore,
    indices: IndexBuffer,
}

impl IndexedMesh {
    /// Creates an empty mesh with the default store settings.
    pub fn new<D: GraphicsDevice>(ctxt: &mut Context<D>, layout: VertexLayout) -> Result<Self> {
        Self::with_settings(ctxt, layout, StoreSettings::default())
    }

    /// Creates an empty mesh. Both buffers use `settings.usage`.
    pub fn with_settings<D: GraphicsDevice>(
        ctxt: &mut Context<D>,
        layout: VertexLayout,
        settings: StoreSettings,
    ) -> Result<Self> {
        let mut vertices = DynamicVertexStore::with_settings(ctxt, layout, settings)?;
        let indices = match IndexBuffer::new(ctxt, settings.usage) {
            Ok(indices) => indices,
            Err(e) => {
                vertices.release(ctxt);
                return Err(e);
            }
        };

        Ok(IndexedMesh { vertices, indices })
    }

    #[inline]
    pub fn vertices(&self) -> &DynamicVertexStore {
        &self.vertices
    }

    #[inline]
    pub fn vertices_mut(&mut self) -> &mut DynamicVertexStore {
        &mut self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    #[inline]
    pub fn indices_mut(&mut self) -> &mut IndexBuffer {
        &mut self.indices
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        self.vertices.layout()
    }

    /// Number of indices sent by the last successful update, i.e. the size of the next draw.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.uploaded()
    }

    /// Appends a vertex and returns its index.
    pub fn append_vertex(&mut self, position: Vec2, color: Color, tex_coord: Vec2) -> VertexIndex {
        let index = self.vertices.vertex_count() as VertexIndex;
        self.vertices.append_vertex(position, color, tex_coord);
        index
    }

    /// Appends a triangle between three existing vertices.
    #[inline]
    pub fn push_triangle(&mut self, a: VertexIndex, b: VertexIndex, c: VertexIndex) {
        self.indices.push_triangle(a, b, c);
    }

    /// Appends `dest` as four shared vertices and two triangles.
    ///
    /// Triangles use the same winding as [`DynamicVertexStore::append_rectangle`].
    pub fn append_quad(&mut self, dest: Rect, colors: CornerColors, tex: Rect) {
        let tl = self.append_vertex(dest.top_left(), colors.top_left, tex.top_left());
        let bl = self.append_vertex(dest.bottom_left(), colors.bottom_left, tex.bottom_left());
        let br = self.append_vertex(
            dest.bottom_right(),
            colors.bottom_right,
            tex.bottom_right(),
        );
        let tr = self.append_vertex(dest.top_right(), colors.top_right, tex.top_right());

        self.push_triangle(tl, bl, br);
        self.push_triangle(tl, br, tr);
    }

    /// Forgets written vertices and indices.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Uploads vertices then indices.
    ///
    /// Both uploads are attempted; the first failure is returned.
    pub fn update<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) -> Result<MeshCounts> {
        let vertices = self.vertices.update(ctxt);
        let indices = self.indices.update(ctxt);

        Ok(MeshCounts {
            vertices: vertices?,
            indices: indices?,
        })
    }

    /// Binds both buffers. Returns `false` if either could not be bound.
    pub fn bind<D: GraphicsDevice>(&self, ctxt: &mut Context<D>) -> bool {
        self.vertices.bind(ctxt) && self.indices.bind(ctxt)
    }

    /// Gives both buffers back to the device.
    pub fn release<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) {
        self.vertices.release(ctxt);
        self.indices.release(ctxt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;
    use crate::context::RecordingDevice;

    #[test]
    fn quads_share_vertices() {
        let mut ctxt = Context::new(RecordingDevice::new());
        let mut mesh = IndexedMesh::new(&mut ctxt, VertexLayout::position_color_texture()).unwrap();

        let colors = CornerColors::uniform(color::WHITE);
        mesh.append_quad(Rect::new(0.0, 0.0, 8.0, 8.0), colors, Rect::UNIT);
        mesh.append_quad(Rect::new(8.0, 0.0, 8.0, 8.0), colors, Rect::UNIT);
        assert_eq!(mesh.indices().indices(), &[0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);

        let counts = mesh.update(&mut ctxt).unwrap();
        assert_eq!(
            counts,
            MeshCounts {
                vertices: 8,
                indices: 12
            }
        );
        assert_eq!(mesh.index_count(), 12);
        mesh.release(&mut ctxt);
        assert_eq!(ctxt.buffer_tracker().live(), 0);
    }

    #[test]
    fn failed_index_buffer_releases_vertex_buffer() {
        let mut ctxt = Context::new(RecordingDevice::new());
        ctxt.device_mut().set_buffer_limit(Some(1));
        let result = IndexedMesh::new(&mut ctxt, VertexLayout::position_color_texture());
        assert!(result.is_err());
        assert_eq!(ctxt.buffer_tracker().live(), 0);
        assert_eq!(ctxt.buffer_tracker().leaked(), 0);
    }
}
