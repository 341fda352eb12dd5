//! wgpu implementation of [`GraphicsDevice`].
//!
//! wgpu has no global binding state and no immediate mode, so this device records binds
//! and draws as [`DrawCall`]s. A frame goes through three steps:
//!
//! ```ignore
//! // Batches upload and draw against the context as usual.
//! renderer.draw(&mut ctxt, &batch, PrimitiveMode::Quads);
//! // Upload the immediate-mode vertices and the generated indices.
//! ctxt.device_mut().flush();
//! // Replay everything into a render pass whose pipeline matches the buffers.
//! ctxt.device().encode(&mut render_pass);
//! ctxt.device_mut().clear_draws();
//! ```

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glamx::Vec2;
use wgpu::util::DeviceExt;

use crate::color::Color;
use crate::context::{
    AttributeFormat, AttributeSlot, BufferId, DeviceCapabilities, GraphicsDevice, PrimitiveMode,
};
use crate::error::DeviceError;
use crate::resource::{BufferTarget, UsageHint, VertexIndex, VERTEX_INDEX_FORMAT};

/// Vertex emitted by the immediate-mode emulation.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ImmediateVertex {
    /// Position in model space.
    pub position: [f32; 2],
    /// Texture coordinates.
    pub tex_coord: [f32; 2],
    /// Normalized RGBA color.
    pub color: [f32; 4],
}

impl ImmediateVertex {
    /// Vertex buffer layout matching [`ImmediateVertex`], at locations 0, 1 and 2.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ImmediateVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 8,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 16,
                shader_location: 2,
            },
        ],
    };
}

/// Where the vertices of a [`DrawCall`] come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VertexSource {
    /// Device buffers, one per vertex buffer slot.
    Buffers(Vec<BufferId>),
    /// The immediate-mode stream buffer.
    Stream,
}

/// Where the indices of a [`DrawCall`] come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexSource {
    /// Non-indexed draw.
    None,
    /// A device element buffer.
    Buffer(BufferId),
    /// Indices generated to emulate loops, fans and quads.
    Generated,
}

/// One recorded draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCall {
    /// Topology the pipeline must use for this draw.
    pub mode: PrimitiveMode,
    /// Vertex buffers to bind.
    pub vertices: VertexSource,
    /// Index buffer to bind.
    pub indices: IndexSource,
    /// Range of vertices, or of indices for indexed draws.
    pub range: Range<u32>,
}

struct WgpuBuffer {
    target: BufferTarget,
    buffer: Option<wgpu::Buffer>,
    len: u64,
}

/// A [`GraphicsDevice`] drawing through wgpu.
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    buffers: HashMap<BufferId, WgpuBuffer>,
    next_buffer_id: u64,
    bound_array: Option<BufferId>,
    bound_elements: Option<BufferId>,
    slots: Vec<BufferId>,
    // Whether `slots` was filled by attribute pointers since the last draw.
    slots_fresh: bool,
    draws: Vec<DrawCall>,
    immediate: Option<(PrimitiveMode, u32)>,
    stream: Vec<ImmediateVertex>,
    stream_buffer: Option<wgpu::Buffer>,
    generated: Vec<VertexIndex>,
    generated_buffer: Option<wgpu::Buffer>,
}

impl WgpuDevice {
    /// Creates a device drawing with the given wgpu device and queue.
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        WgpuDevice {
            device,
            queue,
            buffers: HashMap::new(),
            next_buffer_id: 1,
            bound_array: None,
            bound_elements: None,
            slots: Vec::new(),
            slots_fresh: false,
            draws: Vec::new(),
            immediate: None,
            stream: Vec::new(),
            stream_buffer: None,
            generated: Vec::new(),
            generated_buffer: None,
        }
    }

    /// The wgpu device.
    #[inline]
    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The wgpu queue.
    #[inline]
    pub fn wgpu_queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// The wgpu buffer behind `buffer`, if it has received data.
    pub fn buffer(&self, buffer: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&buffer).and_then(|b| b.buffer.as_ref())
    }

    /// Size of the last upload to `buffer`.
    pub fn buffer_len(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(&buffer).map(|b| b.len)
    }

    /// Draws recorded since the last [`Self::clear_draws`].
    #[inline]
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Uploads the immediate-mode vertices and the generated indices of this frame.
    pub fn flush(&mut self) {
        if !self.stream.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.stream);
            upload_growing(
                &self.device,
                &self.queue,
                &mut self.stream_buffer,
                bytes,
                wgpu::BufferUsages::VERTEX,
                "dungeon2d_immediate_stream",
            );
        }

        if !self.generated.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.generated);
            upload_growing(
                &self.device,
                &self.queue,
                &mut self.generated_buffer,
                bytes,
                wgpu::BufferUsages::INDEX,
                "dungeon2d_generated_indices",
            );
        }
    }

    /// Replays the recorded draws into `pass`.
    ///
    /// The pipeline set on `pass` must match the vertex layout of the drawn buffers. Draws
    /// whose buffers never received data are skipped.
    pub fn encode(&self, pass: &mut wgpu::RenderPass<'_>) {
        for draw in &self.draws {
            if self.encode_draw(draw, pass).is_none() {
                log::debug!("Skipping draw with missing buffers: {:?}", draw);
            }
        }
    }

    /// Forgets the recorded draws, immediate vertices and generated indices.
    ///
    /// An immediate primitive still open is dropped with its vertices.
    pub fn clear_draws(&mut self) {
        if self.immediate.take().is_some() {
            log::warn!("Clearing draws inside begin/end; the open primitive is dropped.");
        }
        self.draws.clear();
        self.stream.clear();
        self.generated.clear();
    }

    fn encode_draw(&self, draw: &DrawCall, pass: &mut wgpu::RenderPass<'_>) -> Option<()> {
        if draw.range.is_empty() {
            return Some(());
        }

        match &draw.vertices {
            VertexSource::Buffers(ids) => {
                for (slot, id) in ids.iter().enumerate() {
                    let buffer = self.buffer(*id)?;
                    pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
            }
            VertexSource::Stream => {
                let buffer = self.stream_buffer.as_ref()?;
                pass.set_vertex_buffer(0, buffer.slice(..));
            }
        }

        match draw.indices {
            IndexSource::None => pass.draw(draw.range.clone(), 0..1),
            IndexSource::Buffer(id) => {
                let buffer = self.buffer(id)?;
                pass.set_index_buffer(buffer.slice(..), VERTEX_INDEX_FORMAT);
                pass.draw_indexed(draw.range.clone(), 0, 0..1);
            }
            IndexSource::Generated => {
                let buffer = self.generated_buffer.as_ref()?;
                pass.set_index_buffer(buffer.slice(..), VERTEX_INDEX_FORMAT);
                pass.draw_indexed(draw.range.clone(), 0, 0..1);
            }
        }

        Some(())
    }

    fn push_generated(&mut self, indices: Vec<VertexIndex>, first: u32) -> Range<u32> {
        let start = self.generated.len() as u32;
        self.generated.extend(indices.into_iter().map(|i| i + first));
        start..self.generated.len() as u32
    }

    /// Vertex buffers of the next draw.
    ///
    /// Without attribute pointers set since the previous draw, this is the bound array
    /// buffer alone.
    fn current_slots(&mut self) -> Vec<BufferId> {
        if !self.slots_fresh {
            self.slots.clear();
            self.slots.extend(self.bound_array);
        }
        self.slots_fresh = false;
        self.slots.clone()
    }
}

/// Writes `bytes` into `slot`, recreating the buffer when it is too small or lacks `usage`.
fn upload_growing(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    slot: &mut Option<wgpu::Buffer>,
    bytes: &[u8],
    usage: wgpu::BufferUsages,
    label: &str,
) {
    let usage = usage | wgpu::BufferUsages::COPY_DST;
    match slot {
        Some(buffer)
            if buffer.size() >= bytes.len() as u64 && buffer.usage().contains(usage) =>
        {
            queue.write_buffer(buffer, 0, bytes);
        }
        _ => {
            log::trace!("Allocating {} ({} bytes).", label, bytes.len());
            *slot = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            }));
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities::HARDWARE_BUFFERS | DeviceCapabilities::INDEXED_DRAW
    }

    fn create_buffer(&mut self, target: BufferTarget) -> Result<BufferId, DeviceError> {
        // The wgpu buffer itself is allocated by the first non-empty upload.
        let id = BufferId::new(self.next_buffer_id);
        self.next_buffer_id += 1;
        let _ = self.buffers.insert(
            id,
            WgpuBuffer {
                target,
                buffer: None,
                len: 0,
            },
        );
        Ok(id)
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferId,
        data: &[u8],
        usage: UsageHint,
    ) -> Result<(), DeviceError> {
        let max_size = self.device.limits().max_buffer_size;
        if data.len() as u64 > max_size {
            return Err(DeviceError::UploadRejected(format!(
                "{} bytes exceed the device limit of {} bytes",
                data.len(),
                max_size
            )));
        }
        if data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(DeviceError::UploadRejected(format!(
                "{} bytes is not a multiple of {}",
                data.len(),
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }

        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(DeviceError::InvalidBuffer(buffer))?;
        entry.len = data.len() as u64;

        if data.is_empty() {
            return Ok(());
        }

        let usages = entry.target.to_wgpu() | usage.to_wgpu();
        upload_growing(
            &self.device,
            &self.queue,
            &mut entry.buffer,
            data,
            usages,
            "dungeon2d_buffer",
        );
        Ok(())
    }

    fn bind_buffer(&mut self, buffer: BufferId, target: BufferTarget) {
        match target {
            BufferTarget::Array => self.bound_array = Some(buffer),
            BufferTarget::ElementArray => self.bound_elements = Some(buffer),
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if let Some(entry) = self.buffers.remove(&buffer) {
            if let Some(buffer) = entry.buffer {
                buffer.destroy();
            }
        }
        if self.bound_array == Some(buffer) {
            self.bound_array = None;
        }
        if self.bound_elements == Some(buffer) {
            self.bound_elements = None;
        }
        self.slots.retain(|slot| *slot != buffer);
    }

    fn set_attribute_pointer(&mut self, _slot: AttributeSlot, _format: AttributeFormat) {
        if !self.slots_fresh {
            self.slots.clear();
            self.slots_fresh = true;
        }

        // Attributes read from the same buffer share one vertex buffer slot; their
        // offsets are part of the pipeline's vertex layout.
        if let Some(bound) = self.bound_array {
            if !self.slots.contains(&bound) {
                self.slots.push(bound);
            }
        }
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        let vertices = VertexSource::Buffers(self.current_slots());
        let draw = match mode.expand_to_list(count) {
            Some(indices) => DrawCall {
                mode: mode.list_mode(),
                vertices,
                indices: IndexSource::Generated,
                range: self.push_generated(indices, first),
            },
            None => DrawCall {
                mode,
                vertices,
                indices: IndexSource::None,
                range: first..first + count,
            },
        };
        self.draws.push(draw);
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32) {
        let Some(elements) = self.bound_elements else {
            log::warn!("draw_elements called without a bound element buffer.");
            return;
        };
        if !mode.is_list_or_strip() {
            log::warn!("Indexed draws in {:?} mode are not supported by wgpu.", mode);
            return;
        }

        let vertices = VertexSource::Buffers(self.current_slots());
        self.draws.push(DrawCall {
            mode,
            vertices,
            indices: IndexSource::Buffer(elements),
            range: 0..count,
        });
    }

    fn begin(&mut self, mode: PrimitiveMode) {
        if self.immediate.is_some() {
            log::warn!("begin called twice without end.");
            self.end();
        }
        self.immediate = Some((mode, self.stream.len() as u32));
    }

    fn vertex(&mut self, position: Vec2, tex_coord: Vec2, color: Color) {
        if self.immediate.is_none() {
            log::warn!("Immediate vertex submitted outside of begin/end.");
            return;
        }
        self.stream.push(ImmediateVertex {
            position: position.into(),
            tex_coord: tex_coord.into(),
            color: [color.r, color.g, color.b, color.a],
        });
    }

    fn end(&mut self) {
        let Some((mode, first)) = self.immediate.take() else {
            log::warn!("end called without begin.");
            return;
        };
        let count = (self.stream.len() as u32).saturating_sub(first);
        let draw = match mode.expand_to_list(count) {
            Some(indices) => DrawCall {
                mode: mode.list_mode(),
                vertices: VertexSource::Stream,
                indices: IndexSource::Generated,
                range: self.push_generated(indices, first),
            },
            None => DrawCall {
                mode,
                vertices: VertexSource::Stream,
                indices: IndexSource::None,
                range: first..first + count,
            },
        };
        self.draws.push(draw);
    }
}
