//! Growable interleaved vertex data with its GPU buffer.

use glamx::{Vec2, Vec3};

use crate::color::Color;
use crate::context::{AttributeFormat, AttributeSlot, Context, GraphicsDevice, ScalarKind};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::resource::{BufferTarget, GpuBuffer, StoreSettings, VertexLayout};

/// Colors of the four corners of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerColors {
    pub top_left: Color,
    pub top_right: Color,
    pub bottom_right: Color,
    pub bottom_left: Color,
}

impl CornerColors {
    /// Corner colors in clockwise order from the top-left corner.
    pub fn new(top_left: Color, top_right: Color, bottom_right: Color, bottom_left: Color) -> Self {
        CornerColors {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// The same color on every corner.
    pub fn uniform(color: Color) -> Self {
        Self::new(color, color, color, color)
    }

    /// Reads exactly four colors, clockwise from the top-left corner.
    pub fn from_slice(colors: &[Color]) -> Result<Self> {
        match colors {
            [tl, tr, br, bl] => Ok(Self::new(*tl, *tr, *br, *bl)),
            _ => Err(Error::InvalidArgument(format!(
                "expected 4 corner colors, got {}",
                colors.len()
            ))),
        }
    }
}

impl From<[Color; 4]> for CornerColors {
    fn from(c: [Color; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// CPU-side vertex data accumulated for one upload, and the buffer it is uploaded to.
///
/// The helpers always write position, color, then texture coordinates, whatever the
/// declared layout is. The layout is only used for the stride and for binding, so it must
/// describe that order (see [`VertexLayout::position_color_texture`]).
///
/// The backing array doubles whenever a vertex might not fit and never shrinks: capacity
/// reached in one frame is reused by the next ones.
pub struct DynamicVertexStore {
    data: Vec<f32>,
    cursor: usize,
    layout: VertexLayout,
    buffer: GpuBuffer,
    uploaded_vertices: usize,
}

impl DynamicVertexStore {
    /// Creates a store with the default settings.
    pub fn new<D: GraphicsDevice>(ctxt: &mut Context<D>, layout: VertexLayout) -> Result<Self> {
        Self::with_settings(ctxt, layout, StoreSettings::default())
    }

    /// Creates a store and acquires its vertex buffer.
    pub fn with_settings<D: GraphicsDevice>(
        ctxt: &mut Context<D>,
        layout: VertexLayout,
        settings: StoreSettings,
    ) -> Result<Self> {
        if settings.initial_capacity == 0 {
            return Err(Error::InvalidArgument(
                "initial capacity must be non-zero".to_string(),
            ));
        }

        let buffer = GpuBuffer::new(ctxt, BufferTarget::Array, settings.usage)?;
        Ok(DynamicVertexStore {
            data: vec![0.0; settings.initial_capacity],
            cursor: 0,
            layout,
            buffer,
            uploaded_vertices: 0,
        })
    }

    /// Number of floats the backing array holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of floats written since the last update or clear.
    #[inline]
    pub fn len(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Number of complete vertices written, or 0 for an empty layout.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        match self.layout.stride() {
            0 => 0,
            stride => self.cursor / stride,
        }
    }

    /// Number of vertices sent by the last successful [`Self::update`].
    #[inline]
    pub fn uploaded_vertices(&self) -> usize {
        self.uploaded_vertices
    }

    /// The written part of the backing array.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data[..self.cursor]
    }

    #[inline]
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Replaces the layout. Data already written is kept as is.
    pub fn set_layout(&mut self, layout: VertexLayout) {
        self.layout = layout;
    }

    #[inline]
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    /// Forgets the written vertices, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    /// Doubles the capacity until `floats` more values (and at least one full vertex) fit.
    ///
    /// Fails with [`Error::ResourceExhausted`], leaving the store untouched, if the required
    /// capacity can't be addressed.
    pub fn ensure_capacity(&mut self, floats: usize) -> Result<()> {
        let exhausted = || {
            Error::ResourceExhausted(format!(
                "vertex store can't grow past {} floats",
                self.data.len()
            ))
        };
        let required = self
            .cursor
            .checked_add(floats.max(self.layout.stride()))
            .ok_or_else(exhausted)?;
        let mut capacity = self.data.len();
        while required >= capacity {
            capacity = capacity.checked_mul(2).ok_or_else(exhausted)?;
        }

        if capacity != self.data.len() {
            log::debug!(
                "Growing vertex store from {} to {} floats.",
                self.data.len(),
                capacity
            );
            self.data.resize(capacity, 0.0);
        }
        Ok(())
    }

    /// Makes room for one vertex of `floats` values. Returns `false` if the store can't grow.
    fn reserve_vertex(&mut self, floats: usize) -> bool {
        match self.ensure_capacity(floats) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Dropping vertex: {}", e);
                false
            }
        }
    }

    #[inline]
    fn write(&mut self, values: &[f32]) {
        self.data[self.cursor..self.cursor + values.len()].copy_from_slice(values);
        self.cursor += values.len();
    }

    /// Appends a 2D vertex.
    pub fn append_vertex(&mut self, position: Vec2, color: Color, tex_coord: Vec2) {
        if !self.reserve_vertex(8) {
            return;
        }
        self.write(&[
            position.x,
            position.y,
            color.r,
            color.g,
            color.b,
            color.a,
            tex_coord.x,
            tex_coord.y,
        ]);
    }

    /// Appends a vertex with a depth coordinate.
    ///
    /// Pairs with [`VertexLayout::position3_color_texture`].
    pub fn append_vertex3(&mut self, position: Vec3, color: Color, tex_coord: Vec2) {
        if !self.reserve_vertex(9) {
            return;
        }
        self.write(&[
            position.x,
            position.y,
            position.z,
            color.r,
            color.g,
            color.b,
            color.a,
            tex_coord.x,
            tex_coord.y,
        ]);
    }

    /// Appends an untextured vertex, with texture coordinates at the origin.
    #[inline]
    pub fn append_colored_vertex(&mut self, position: Vec2, color: Color) {
        self.append_vertex(position, color, Vec2::ZERO);
    }

    /// Appends an untextured segment, for line list draws.
    pub fn append_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.append_colored_vertex(from, color);
        self.append_colored_vertex(to, color);
    }

    /// Appends `dest` as two triangles textured with `tex`.
    ///
    /// Vertices are top-left, bottom-left, bottom-right, top-left, bottom-right, top-right.
    pub fn append_rectangle(&mut self, dest: Rect, color: Color, tex: Rect) {
        self.append_rectangle_corners(dest, CornerColors::uniform(color), tex);
    }

    /// Same as [`Self::append_rectangle`] with one color per corner.
    pub fn append_rectangle_corners(&mut self, dest: Rect, colors: CornerColors, tex: Rect) {
        let tl = (dest.top_left(), colors.top_left, tex.top_left());
        let bl = (dest.bottom_left(), colors.bottom_left, tex.bottom_left());
        let br = (dest.bottom_right(), colors.bottom_right, tex.bottom_right());
        let tr = (dest.top_right(), colors.top_right, tex.top_right());

        for (position, color, tex_coord) in [tl, bl, br, tl, br, tr] {
            self.append_vertex(position, color, tex_coord);
        }
    }

    /// Uploads the written vertices and starts a new batch.
    ///
    /// Returns the number of vertices uploaded, 0 if the layout is empty. The write cursor
    /// is reset even if the upload fails.
    pub fn update<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) -> Result<usize> {
        let count = self.vertex_count();
        let result = self.buffer.upload(ctxt, &self.data[..self.cursor]);
        self.cursor = 0;

        result?;
        self.uploaded_vertices = count;
        Ok(count)
    }

    /// Binds the vertex buffer and points every attribute of the layout into it.
    ///
    /// Returns `false` if the buffer was released or no shader attributes are active.
    /// Attributes unknown to the active shader are skipped.
    pub fn bind<D: GraphicsDevice>(&self, ctxt: &mut Context<D>) -> bool {
        if self.buffer.is_released() {
            return false;
        }

        let locations: Vec<Option<u32>> = match ctxt.attributes() {
            Some(resolver) => self
                .layout
                .attributes()
                .iter()
                .map(|a| resolver.resolve_attribute_location(a.name()))
                .collect(),
            None => return false,
        };

        let _ = self.buffer.bind(ctxt);

        let stride = self.layout.stride_bytes() as u32;
        for ((attribute, offset), location) in self.layout.offsets().zip(locations) {
            let Some(location) = location else {
                log::trace!("Attribute `{}` unused by the shader.", attribute.name());
                continue;
            };

            ctxt.device_mut().set_attribute_pointer(
                AttributeSlot::Location(location),
                AttributeFormat {
                    components: attribute.components(),
                    kind: ScalarKind::Float32,
                    stride,
                    offset: offset as u32,
                },
            );
        }

        true
    }

    /// Gives the vertex buffer back to the device.
    pub fn release<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) {
        self.buffer.release(ctxt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{self, Color};
    use crate::context::{DeviceCommand, RecordingDevice, ShaderAttributes};
    use std::rc::Rc;

    fn context() -> Context<RecordingDevice> {
        Context::new(RecordingDevice::new())
    }

    fn store(ctxt: &mut Context<RecordingDevice>, capacity: usize) -> DynamicVertexStore {
        DynamicVertexStore::with_settings(
            ctxt,
            VertexLayout::position_color_texture(),
            StoreSettings::default().with_initial_capacity(capacity),
        )
        .unwrap()
    }

    #[test]
    fn growth_doubles_and_keeps_data() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 16);

        for i in 0..10 {
            store.append_vertex(Vec2::new(i as f32, -(i as f32)), color::WHITE, Vec2::ZERO);
        }

        let capacity = store.capacity();
        assert!(capacity >= 80);
        assert_eq!(capacity % 16, 0);
        assert!((capacity / 16).is_power_of_two());
        for i in 0..10 {
            assert_eq!(store.data()[i * 8], i as f32);
            assert_eq!(store.data()[i * 8 + 1], -(i as f32));
        }
        store.release(&mut ctxt);
    }

    #[test]
    fn update_returns_vertex_count_and_resets() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        for _ in 0..5 {
            store.append_vertex(Vec2::ONE, color::RED, Vec2::ZERO);
        }

        assert_eq!(store.update(&mut ctxt).unwrap(), 5);
        assert_eq!(store.uploaded_vertices(), 5);
        assert!(store.is_empty());

        let id = store.buffer().id().unwrap();
        assert_eq!(ctxt.device().buffer_bytes(id).map(|b| b.len()), Some(5 * 8 * 4));
        store.release(&mut ctxt);
    }

    #[test]
    fn appended_vertex_reads_back() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        let c = Color::new(0.25, 0.5, 0.75, 1.0);
        store.append_vertex(Vec2::new(3.0, 4.0), c, Vec2::new(0.5, 1.0));

        assert_eq!(store.data(), &[3.0, 4.0, 0.25, 0.5, 0.75, 1.0, 0.5, 1.0]);
        store.release(&mut ctxt);
    }

    #[test]
    fn rectangle_uses_fixed_winding() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        store.append_rectangle(Rect::new(0.0, 0.0, 10.0, 10.0), color::WHITE, Rect::UNIT);

        assert_eq!(store.vertex_count(), 6);
        let positions: Vec<(f32, f32)> = store
            .data()
            .chunks_exact(8)
            .map(|v| (v[0], v[1]))
            .collect();
        assert_eq!(
            positions,
            vec![
                (0.0, 0.0),
                (0.0, 10.0),
                (10.0, 10.0),
                (0.0, 0.0),
                (10.0, 10.0),
                (10.0, 0.0)
            ]
        );
        let tex: Vec<(f32, f32)> = store
            .data()
            .chunks_exact(8)
            .map(|v| (v[6], v[7]))
            .collect();
        assert_eq!(tex[1], (0.0, 1.0));
        assert_eq!(tex[5], (1.0, 0.0));
        store.release(&mut ctxt);
    }

    #[test]
    fn corner_colors_follow_corners() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        let colors = CornerColors::new(color::RED, color::LIME, color::BLUE, color::YELLOW);
        store.append_rectangle_corners(Rect::new(0.0, 0.0, 1.0, 1.0), colors, Rect::UNIT);

        let firsts: Vec<f32> = store.data().chunks_exact(8).map(|v| v[2]).collect();
        // Red channel of TL, BL, BR, TL, BR, TR.
        assert_eq!(firsts, vec![1.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        store.release(&mut ctxt);
    }

    #[test]
    fn wrong_corner_count_is_rejected() {
        let three = [color::RED, color::LIME, color::BLUE];
        assert!(matches!(
            CornerColors::from_slice(&three),
            Err(Error::InvalidArgument(_))
        ));
        assert!(CornerColors::from_slice(&[color::RED; 4]).is_ok());
    }

    #[test]
    fn clear_then_update_uploads_nothing() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        store.append_vertex(Vec2::ONE, color::RED, Vec2::ZERO);
        let capacity = store.capacity();
        store.clear();

        ctxt.device_mut().clear_commands();
        assert_eq!(store.update(&mut ctxt).unwrap(), 0);
        assert_eq!(store.capacity(), capacity);
        assert!(matches!(
            ctxt.device().commands(),
            [DeviceCommand::Upload { bytes: 0, .. }]
        ));
        store.release(&mut ctxt);
    }

    #[test]
    fn empty_layout_reports_no_vertices() {
        let mut ctxt = context();
        let mut store = DynamicVertexStore::new(&mut ctxt, VertexLayout::new()).unwrap();
        store.append_vertex(Vec2::ONE, color::RED, Vec2::ZERO);
        assert_eq!(store.update(&mut ctxt).unwrap(), 0);
        store.release(&mut ctxt);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut ctxt = context();
        let result = DynamicVertexStore::with_settings(
            &mut ctxt,
            VertexLayout::position_color_texture(),
            StoreSettings::default().with_initial_capacity(0),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn failed_update_still_resets_cursor() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        store.append_vertex(Vec2::ONE, color::RED, Vec2::ZERO);
        ctxt.device_mut().set_reject_uploads(true);

        assert!(matches!(
            store.update(&mut ctxt),
            Err(Error::UploadFailed { .. })
        ));
        assert!(store.is_empty());
        assert_eq!(store.uploaded_vertices(), 0);
        store.release(&mut ctxt);
    }

    #[test]
    fn bind_skips_unknown_attributes() {
        let mut ctxt = context();
        let store = store(&mut ctxt, 64);
        assert!(!store.bind(&mut ctxt));

        ctxt.use_attributes(Some(Rc::new(
            ShaderAttributes::new().with("position", 0).with("texcoord", 5),
        )));
        ctxt.device_mut().clear_commands();
        assert!(store.bind(&mut ctxt));

        let id = store.buffer().id().unwrap();
        let expected = vec![
            DeviceCommand::Bind(id, BufferTarget::Array),
            DeviceCommand::AttributePointer(
                AttributeSlot::Location(0),
                AttributeFormat {
                    components: 2,
                    kind: ScalarKind::Float32,
                    stride: 32,
                    offset: 0,
                },
            ),
            DeviceCommand::AttributePointer(
                AttributeSlot::Location(5),
                AttributeFormat {
                    components: 2,
                    kind: ScalarKind::Float32,
                    stride: 32,
                    offset: 24,
                },
            ),
        ];
        assert_eq!(ctxt.device().commands(), &expected[..]);

        let mut store = store;
        store.release(&mut ctxt);
        assert!(!store.bind(&mut ctxt));
    }

    #[test]
    fn unaddressable_growth_is_exhaustion() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 16);
        store.append_vertex(Vec2::ONE, color::RED, Vec2::ZERO);

        assert!(matches!(
            store.ensure_capacity(usize::MAX),
            Err(Error::ResourceExhausted(_))
        ));
        assert_eq!(store.capacity(), 16);
        assert_eq!(store.len(), 8);
        assert!(store.ensure_capacity(100).is_ok());
        assert_eq!(store.capacity(), 128);
        store.release(&mut ctxt);
    }

    #[test]
    fn lines_are_untextured_vertex_pairs() {
        let mut ctxt = context();
        let mut store = store(&mut ctxt, 64);
        store.append_line(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), color::LIME);

        assert_eq!(store.vertex_count(), 2);
        assert_eq!(
            store.data(),
            &[
                1.0, 2.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0,
                3.0, 4.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0,
            ]
        );
        store.release(&mut ctxt);
    }

    #[test]
    fn depth_vertices_match_the_3d_layout() {
        let mut ctxt = context();
        let mut store =
            DynamicVertexStore::new(&mut ctxt, VertexLayout::position3_color_texture()).unwrap();
        store.append_vertex3(Vec3::new(1.0, 2.0, 0.5), color::WHITE, Vec2::ONE);
        store.append_vertex3(Vec3::ZERO, color::BLACK, Vec2::ZERO);

        assert_eq!(store.layout().stride(), 9);
        assert_eq!(store.vertex_count(), 2);
        assert_eq!(&store.data()[..3], &[1.0, 2.0, 0.5]);
        assert_eq!(store.update(&mut ctxt).unwrap(), 2);
        store.release(&mut ctxt);
    }
}
