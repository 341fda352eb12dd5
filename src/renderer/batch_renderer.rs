//! Draws batches, vertex stores and indexed meshes.

use glamx::Vec2;

use crate::color;
use crate::context::{
    AttributeFormat, AttributeSlot, Context, DeviceCapabilities, GraphicsDevice, PrimitiveMode,
    ScalarKind,
};
use crate::resource::{Batch, DynamicVertexStore, IndexedMesh};

/// How a draw reached the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawPath {
    /// One draw call from GPU-resident buffers.
    Hardware,
    /// One immediate-mode vertex per point.
    Immediate,
    /// Nothing was drawn.
    Skipped,
}

/// Per-path counters, reset with [`BatchRenderer::reset_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Draw calls issued from hardware buffers.
    pub hardware_draws: usize,
    /// Vertices submitted through the immediate path.
    pub immediate_vertices: usize,
}

/// Chooses between hardware buffers and immediate submission depending on the device.
#[derive(Clone, Debug, Default)]
pub struct BatchRenderer {
    stats: RenderStats,
}

impl BatchRenderer {
    /// Creates a renderer with zeroed stats.
    pub fn new() -> BatchRenderer {
        BatchRenderer::default()
    }

    #[inline]
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    /// Draws the points of `batch` assembled with `mode`.
    ///
    /// With hardware buffers the three batch buffers are bound and drawn in one call, so
    /// [`Batch::apply`] must have been called since the last change. Otherwise every point is
    /// submitted from the CPU-side sequences.
    pub fn draw<D: GraphicsDevice>(
        &mut self,
        ctxt: &mut Context<D>,
        batch: &Batch,
        mode: PrimitiveMode,
    ) -> DrawPath {
        if batch.is_empty() {
            return DrawPath::Skipped;
        }

        if ctxt.supports_hardware_buffers() {
            self.draw_hardware(ctxt, batch, mode)
        } else {
            self.draw_immediate(ctxt, batch, mode)
        }
    }

    fn draw_hardware<D: GraphicsDevice>(
        &mut self,
        ctxt: &mut Context<D>,
        batch: &Batch,
        mode: PrimitiveMode,
    ) -> DrawPath {
        let [positions, tex_coords, colors] = batch.buffers();
        if positions.is_released() || tex_coords.is_released() || colors.is_released() {
            log::warn!("Drawing a batch whose buffers were released.");
            return DrawPath::Skipped;
        }

        let attributes = [
            (positions, AttributeSlot::Position, 2, ScalarKind::Int32),
            (tex_coords, AttributeSlot::TexCoord, 2, ScalarKind::Int32),
            (colors, AttributeSlot::Color, 1, ScalarKind::PackedRgba8),
        ];
        for (buffer, slot, components, kind) in attributes {
            let _ = buffer.bind(ctxt);
            ctxt.device_mut().set_attribute_pointer(
                slot,
                AttributeFormat {
                    components,
                    kind,
                    stride: components * kind.size_in_bytes(),
                    offset: 0,
                },
            );
        }

        ctxt.device_mut()
            .draw_arrays(mode, 0, batch.len() as u32);
        self.stats.hardware_draws += 1;
        DrawPath::Hardware
    }

    fn draw_immediate<D: GraphicsDevice>(
        &mut self,
        ctxt: &mut Context<D>,
        batch: &Batch,
        mode: PrimitiveMode,
    ) -> DrawPath {
        let device = ctxt.device_mut();
        device.begin(mode);
        for ((position, tex_coord), packed) in batch
            .positions()
            .iter()
            .zip(batch.tex_coords())
            .zip(batch.colors())
        {
            device.vertex(
                Vec2::from(*position),
                Vec2::from(*tex_coord),
                color::unpack_rgba(*packed),
            );
        }
        device.end();

        self.stats.immediate_vertices += batch.len();
        DrawPath::Immediate
    }

    /// Draws the first `count` vertices last uploaded by `store`, as triangles.
    ///
    /// Stores only live in hardware buffers: on a device without them, or when the store
    /// can't be bound, nothing is drawn.
    pub fn draw_store<D: GraphicsDevice>(
        &mut self,
        ctxt: &mut Context<D>,
        store: &DynamicVertexStore,
        count: usize,
    ) -> DrawPath {
        if count == 0 {
            return DrawPath::Skipped;
        }
        if !ctxt.supports_hardware_buffers() {
            log::warn!("Vertex stores need hardware buffers; skipping draw.");
            return DrawPath::Skipped;
        }
        if !store.bind(ctxt) {
            return DrawPath::Skipped;
        }

        ctxt.device_mut()
            .draw_arrays(PrimitiveMode::Triangles, 0, count as u32);
        self.stats.hardware_draws += 1;
        DrawPath::Hardware
    }

    /// Draws the indices last uploaded by `mesh`, as triangles.
    pub fn draw_mesh<D: GraphicsDevice>(
        &mut self,
        ctxt: &mut Context<D>,
        mesh: &IndexedMesh,
    ) -> DrawPath {
        let required = DeviceCapabilities::HARDWARE_BUFFERS | DeviceCapabilities::INDEXED_DRAW;
        if mesh.index_count() == 0 {
            return DrawPath::Skipped;
        }
        if !ctxt.capabilities().contains(required) {
            log::warn!("Indexed meshes need hardware buffers and indexed draws; skipping draw.");
            return DrawPath::Skipped;
        }
        if !mesh.bind(ctxt) {
            return DrawPath::Skipped;
        }

        ctxt.device_mut()
            .draw_elements(PrimitiveMode::Triangles, mesh.index_count() as u32);
        self.stats.hardware_draws += 1;
        DrawPath::Hardware
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{self, Color};
    use crate::context::{DeviceCommand, RecordingDevice, ShaderAttributes};
    use crate::geometry::{Point, Rect, Rectangle};
    use crate::resource::{BufferTarget, CornerColors, VertexLayout};
    use std::rc::Rc;

    fn filled_batch(ctxt: &mut Context<RecordingDevice>) -> Batch {
        let mut batch = Batch::new(ctxt).unwrap();
        batch.add_rectangle(
            Rectangle::new(0, 0, 10, 10),
            color::RED,
            Rectangle::new(0, 0, 1, 1),
        );
        batch.apply(ctxt).unwrap();
        batch
    }

    #[test]
    fn hardware_path_binds_three_buffers_and_draws_once() {
        let mut ctxt = Context::new(RecordingDevice::new());
        let mut batch = filled_batch(&mut ctxt);
        let mut renderer = BatchRenderer::new();
        ctxt.device_mut().clear_commands();

        let path = renderer.draw(&mut ctxt, &batch, PrimitiveMode::Quads);
        assert_eq!(path, DrawPath::Hardware);

        let commands = ctxt.device().commands();
        let binds = commands
            .iter()
            .filter(|c| matches!(c, DeviceCommand::Bind(_, BufferTarget::Array)))
            .count();
        assert_eq!(binds, 3);
        assert_eq!(
            commands.last(),
            Some(&DeviceCommand::DrawArrays {
                mode: PrimitiveMode::Quads,
                first: 0,
                count: 4
            })
        );
        assert!(commands.contains(&DeviceCommand::AttributePointer(
            AttributeSlot::Color,
            AttributeFormat {
                components: 1,
                kind: ScalarKind::PackedRgba8,
                stride: 4,
                offset: 0,
            }
        )));
        assert_eq!(renderer.stats().hardware_draws, 1);
        batch.release(&mut ctxt);
    }

    #[test]
    fn immediate_path_submits_every_point() {
        let mut ctxt = Context::new(RecordingDevice::immediate_only());
        let mut batch = filled_batch(&mut ctxt);
        let mut renderer = BatchRenderer::new();
        ctxt.device_mut().clear_commands();

        let path = renderer.draw(&mut ctxt, &batch, PrimitiveMode::Quads);
        assert_eq!(path, DrawPath::Immediate);

        let commands = ctxt.device().commands();
        assert_eq!(commands.len(), 6);
        assert_eq!(commands[0], DeviceCommand::Begin(PrimitiveMode::Quads));
        assert_eq!(
            commands[2],
            DeviceCommand::Vertex {
                position: Vec2::new(10.0, 0.0),
                tex_coord: Vec2::new(1.0, 0.0),
                color: color::RED,
            }
        );
        assert_eq!(commands[5], DeviceCommand::End);
        assert!(!commands
            .iter()
            .any(|c| matches!(c, DeviceCommand::DrawArrays { .. })));
        assert_eq!(renderer.stats().immediate_vertices, 4);
        batch.release(&mut ctxt);
    }

    #[test]
    fn empty_batch_is_skipped() {
        let mut ctxt = Context::new(RecordingDevice::new());
        let mut batch = Batch::new(&mut ctxt).unwrap();
        let mut renderer = BatchRenderer::new();
        assert_eq!(
            renderer.draw(&mut ctxt, &batch, PrimitiveMode::Lines),
            DrawPath::Skipped
        );
        batch.add_line(Point::new(0, 0), Point::new(1, 1), color::WHITE);
        batch.release(&mut ctxt);
        assert_eq!(
            renderer.draw(&mut ctxt, &batch, PrimitiveMode::Lines),
            DrawPath::Skipped
        );
    }

    #[test]
    fn store_draw_needs_attributes() {
        let mut ctxt = Context::new(RecordingDevice::new());
        let mut store =
            DynamicVertexStore::new(&mut ctxt, VertexLayout::position_color_texture()).unwrap();
        store.append_rectangle(Rect::new(0.0, 0.0, 4.0, 4.0), color::WHITE, Rect::UNIT);
        let count = store.update(&mut ctxt).unwrap();

        let mut renderer = BatchRenderer::new();
        assert_eq!(
            renderer.draw_store(&mut ctxt, &store, count),
            DrawPath::Skipped
        );

        ctxt.use_attributes(Some(Rc::new(
            ShaderAttributes::new()
                .with("position", 0)
                .with("color", 1)
                .with("texcoord", 2),
        )));
        assert_eq!(
            renderer.draw_store(&mut ctxt, &store, count),
            DrawPath::Hardware
        );
        assert_eq!(
            ctxt.device().commands().last(),
            Some(&DeviceCommand::DrawArrays {
                mode: PrimitiveMode::Triangles,
                first: 0,
                count: 6
            })
        );
        store.release(&mut ctxt);
    }

    #[test]
    fn mesh_draw_uses_elements() {
        let mut ctxt = Context::new(RecordingDevice::new());
        ctxt.use_attributes(Some(Rc::new(ShaderAttributes::new().with("position", 0))));
        let mut mesh = IndexedMesh::new(&mut ctxt, VertexLayout::position_color_texture()).unwrap();
        mesh.append_quad(
            Rect::new(0.0, 0.0, 2.0, 2.0),
            CornerColors::uniform(Color::new(0.0, 0.0, 0.0, 1.0)),
            Rect::UNIT,
        );
        let _ = mesh.update(&mut ctxt).unwrap();

        let mut renderer = BatchRenderer::new();
        assert_eq!(renderer.draw_mesh(&mut ctxt, &mesh), DrawPath::Hardware);
        assert_eq!(
            ctxt.device().bound(BufferTarget::ElementArray),
            mesh.indices().buffer().id()
        );
        assert_eq!(
            ctxt.device().commands().last(),
            Some(&DeviceCommand::DrawElements {
                mode: PrimitiveMode::Triangles,
                count: 6
            })
        );
        mesh.release(&mut ctxt);
    }
}
