//! A headless device that keeps uploads in memory and records every command.

use std::collections::HashMap;

use bytemuck::AnyBitPattern;
use glamx::Vec2;

use crate::color::Color;
use crate::context::{
    AttributeFormat, AttributeSlot, BufferId, DeviceCapabilities, GraphicsDevice, PrimitiveMode,
};
use crate::error::DeviceError;
use crate::resource::{BufferTarget, UsageHint};

/// A command received by a [`RecordingDevice`].
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCommand {
    CreateBuffer(BufferId, BufferTarget),
    Upload {
        buffer: BufferId,
        bytes: usize,
        usage: UsageHint,
    },
    Bind(BufferId, BufferTarget),
    Destroy(BufferId),
    AttributePointer(AttributeSlot, AttributeFormat),
    DrawArrays {
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    },
    DrawElements {
        mode: PrimitiveMode,
        count: u32,
    },
    Begin(PrimitiveMode),
    Vertex {
        position: Vec2,
        tex_coord: Vec2,
        color: Color,
    },
    End,
}

#[derive(Clone, Debug)]
struct RecordedBuffer {
    target: BufferTarget,
    data: Vec<u8>,
    usage: Option<UsageHint>,
}

/// A [`GraphicsDevice`] without a GPU.
///
/// Buffers are plain byte vectors and every call is appended to a command log, which makes
/// this device suitable for headless runs and for inspecting what a batch sends to the GPU.
pub struct RecordingDevice {
    capabilities: DeviceCapabilities,
    buffers: HashMap<BufferId, RecordedBuffer>,
    bound: HashMap<BufferTarget, BufferId>,
    next_buffer_id: u64,
    commands: Vec<DeviceCommand>,
    buffer_limit: Option<usize>,
    reject_uploads: bool,
    in_primitive: bool,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// A device supporting hardware buffers and indexed draws.
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::all())
    }

    /// A device that only has the immediate-mode path.
    pub fn immediate_only() -> Self {
        Self::with_capabilities(DeviceCapabilities::empty())
    }

    /// A device with the given capabilities.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        RecordingDevice {
            capabilities,
            buffers: HashMap::new(),
            bound: HashMap::new(),
            next_buffer_id: 1,
            commands: Vec::new(),
            buffer_limit: None,
            reject_uploads: false,
            in_primitive: false,
        }
    }

    /// Limits the number of buffers alive at the same time.
    pub fn set_buffer_limit(&mut self, limit: Option<usize>) {
        self.buffer_limit = limit;
    }

    /// Makes every following upload fail with [`DeviceError::UploadRejected`].
    pub fn set_reject_uploads(&mut self, reject: bool) {
        self.reject_uploads = reject;
    }

    /// Every command received so far.
    #[inline]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Forgets the recorded commands. Buffer contents are kept.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of buffers currently alive.
    #[inline]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Whether `buffer` is alive on this device.
    #[inline]
    pub fn contains(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer)
    }

    /// Raw content of `buffer`.
    pub fn buffer_bytes(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| &b.data[..])
    }

    /// Content of `buffer` reinterpreted as a sequence of `T`.
    pub fn buffer_contents<T: AnyBitPattern>(&self, buffer: BufferId) -> Option<Vec<T>> {
        let size = std::mem::size_of::<T>();
        self.buffer_bytes(buffer).map(|bytes| {
            bytes
                .chunks_exact(size)
                .map(bytemuck::pod_read_unaligned)
                .collect()
        })
    }

    /// The usage hint of the last upload to `buffer`.
    pub fn buffer_usage(&self, buffer: BufferId) -> Option<UsageHint> {
        self.buffers.get(&buffer).and_then(|b| b.usage)
    }

    /// The target `buffer` was created for.
    pub fn buffer_target(&self, buffer: BufferId) -> Option<BufferTarget> {
        self.buffers.get(&buffer).map(|b| b.target)
    }

    /// The buffer currently bound to `target`.
    pub fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        self.bound.get(&target).copied()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_buffer(&mut self, target: BufferTarget) -> Result<BufferId, DeviceError> {
        if let Some(limit) = self.buffer_limit {
            if self.buffers.len() >= limit {
                return Err(DeviceError::OutOfMemory);
            }
        }

        let id = BufferId::new(self.next_buffer_id);
        self.next_buffer_id += 1;
        let _ = self.buffers.insert(
            id,
            RecordedBuffer {
                target,
                data: Vec::new(),
                usage: None,
            },
        );
        self.commands.push(DeviceCommand::CreateBuffer(id, target));
        Ok(id)
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferId,
        data: &[u8],
        usage: UsageHint,
    ) -> Result<(), DeviceError> {
        if self.reject_uploads {
            return Err(DeviceError::UploadRejected(
                "uploads are disabled on this device".to_string(),
            ));
        }

        let recorded = self
            .buffers
            .get_mut(&buffer)
            .ok_or(DeviceError::InvalidBuffer(buffer))?;
        recorded.data.clear();
        recorded.data.extend_from_slice(data);
        recorded.usage = Some(usage);

        self.commands.push(DeviceCommand::Upload {
            buffer,
            bytes: data.len(),
            usage,
        });
        Ok(())
    }

    fn bind_buffer(&mut self, buffer: BufferId, target: BufferTarget) {
        let _ = self.bound.insert(target, buffer);
        self.commands.push(DeviceCommand::Bind(buffer, target));
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("Destroying unknown buffer {:?}.", buffer);
        }
        self.bound.retain(|_, bound| *bound != buffer);
        self.commands.push(DeviceCommand::Destroy(buffer));
    }

    fn set_attribute_pointer(&mut self, slot: AttributeSlot, format: AttributeFormat) {
        self.commands
            .push(DeviceCommand::AttributePointer(slot, format));
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        self.commands
            .push(DeviceCommand::DrawArrays { mode, first, count });
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32) {
        self.commands.push(DeviceCommand::DrawElements { mode, count });
    }

    fn begin(&mut self, mode: PrimitiveMode) {
        debug_assert!(!self.in_primitive, "begin called twice without end");
        self.in_primitive = true;
        self.commands.push(DeviceCommand::Begin(mode));
    }

    fn vertex(&mut self, position: Vec2, tex_coord: Vec2, color: Color) {
        debug_assert!(self.in_primitive, "vertex submitted outside begin/end");
        self.commands.push(DeviceCommand::Vertex {
            position,
            tex_coord,
            color,
        });
    }

    fn end(&mut self) {
        debug_assert!(self.in_primitive, "end called without begin");
        self.in_primitive = false;
        self.commands.push(DeviceCommand::End);
    }
}
