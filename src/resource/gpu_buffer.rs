//! Owned handle to a device buffer object.

use std::rc::Rc;

use bytemuck::Pod;

use crate::context::{BufferId, BufferTracker, Context, GraphicsDevice};
use crate::error::{Error, Result};

/// Type of gpu buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferTarget {
    /// A vertex buffer (bindable as vertex data).
    Array,
    /// An index buffer (bindable as index data).
    ElementArray,
}

impl BufferTarget {
    /// Converts to wgpu buffer usages.
    #[inline]
    pub fn to_wgpu(self) -> wgpu::BufferUsages {
        match self {
            BufferTarget::Array => wgpu::BufferUsages::VERTEX,
            BufferTarget::ElementArray => wgpu::BufferUsages::INDEX,
        }
    }
}

/// How often the content of a buffer is expected to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateFrequency {
    /// Uploaded once, used many times.
    Static,
    /// Modified repeatedly, used many times.
    Dynamic,
    /// Modified once per use.
    Stream,
}

/// Who reads the content of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferAccess {
    /// Written by the application, read by the GPU.
    Draw,
    /// Written by the GPU, read back by the application.
    Read,
    /// Written and read by the GPU.
    Copy,
}

/// Usage hint given to the driver when uploading a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UsageHint {
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
    StreamDraw,
    StreamRead,
    StreamCopy,
}

impl UsageHint {
    /// Combines a frequency and an access pattern.
    pub fn new(frequency: UpdateFrequency, access: BufferAccess) -> Self {
        use BufferAccess::*;
        use UpdateFrequency::*;

        match (frequency, access) {
            (Static, Draw) => UsageHint::StaticDraw,
            (Static, Read) => UsageHint::StaticRead,
            (Static, Copy) => UsageHint::StaticCopy,
            (Dynamic, Draw) => UsageHint::DynamicDraw,
            (Dynamic, Read) => UsageHint::DynamicRead,
            (Dynamic, Copy) => UsageHint::DynamicCopy,
            (Stream, Draw) => UsageHint::StreamDraw,
            (Stream, Read) => UsageHint::StreamRead,
            (Stream, Copy) => UsageHint::StreamCopy,
        }
    }

    /// The update frequency part of this hint.
    pub fn frequency(self) -> UpdateFrequency {
        match self {
            UsageHint::StaticDraw | UsageHint::StaticRead | UsageHint::StaticCopy => {
                UpdateFrequency::Static
            }
            UsageHint::DynamicDraw | UsageHint::DynamicRead | UsageHint::DynamicCopy => {
                UpdateFrequency::Dynamic
            }
            UsageHint::StreamDraw | UsageHint::StreamRead | UsageHint::StreamCopy => {
                UpdateFrequency::Stream
            }
        }
    }

    /// The access part of this hint.
    pub fn access(self) -> BufferAccess {
        match self {
            UsageHint::StaticDraw | UsageHint::DynamicDraw | UsageHint::StreamDraw => {
                BufferAccess::Draw
            }
            UsageHint::StaticRead | UsageHint::DynamicRead | UsageHint::StreamRead => {
                BufferAccess::Read
            }
            UsageHint::StaticCopy | UsageHint::DynamicCopy | UsageHint::StreamCopy => {
                BufferAccess::Copy
            }
        }
    }

    /// Extra wgpu usages implied by this hint.
    ///
    /// wgpu places memory itself, so only the access part matters: buffers the GPU reads
    /// back from must be copy sources.
    pub fn to_wgpu(self) -> wgpu::BufferUsages {
        match self.access() {
            BufferAccess::Draw => wgpu::BufferUsages::empty(),
            BufferAccess::Read | BufferAccess::Copy => wgpu::BufferUsages::COPY_SRC,
        }
    }
}

/// A buffer object on the device of a [`Context`].
///
/// The device buffer is acquired by [`GpuBuffer::new`] and must be given back with
/// [`GpuBuffer::release`]. Dropping a buffer that was not released leaks the device buffer;
/// this is logged and counted by the context's [`BufferTracker`].
pub struct GpuBuffer {
    id: Option<BufferId>,
    target: BufferTarget,
    usage: UsageHint,
    size_in_bytes: usize,
    tracker: Rc<BufferTracker>,
}

impl GpuBuffer {
    /// Acquires a new, empty device buffer.
    pub fn new<D: GraphicsDevice>(
        ctxt: &mut Context<D>,
        target: BufferTarget,
        usage: UsageHint,
    ) -> Result<GpuBuffer> {
        let id = ctxt
            .device_mut()
            .create_buffer(target)
            .map_err(|e| Error::ResourceExhausted(e.to_string()))?;
        let tracker = ctxt.buffer_tracker().clone();
        tracker.acquired();

        Ok(GpuBuffer {
            id: Some(id),
            target,
            usage,
            size_in_bytes: 0,
            tracker,
        })
    }

    /// The device id, or `None` once released.
    #[inline]
    pub fn id(&self) -> Option<BufferId> {
        self.id
    }

    /// Whether [`Self::release`] has been called.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.id.is_none()
    }

    #[inline]
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// The usage hint of the next upload.
    #[inline]
    pub fn usage(&self) -> UsageHint {
        self.usage
    }

    #[inline]
    pub fn set_usage(&mut self, usage: UsageHint) {
        self.usage = usage;
    }

    /// Size of the last successful upload.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    /// Replaces the content of the buffer with `data`.
    ///
    /// An empty slice is a valid, zero-sized upload.
    pub fn upload<D: GraphicsDevice, T: Pod>(
        &mut self,
        ctxt: &mut Context<D>,
        data: &[T],
    ) -> Result<()> {
        self.upload_with_usage(ctxt, data, self.usage)
    }

    /// Replaces the content of the buffer with `data`, using `usage` from now on.
    pub fn upload_with_usage<D: GraphicsDevice, T: Pod>(
        &mut self,
        ctxt: &mut Context<D>,
        data: &[T],
        usage: UsageHint,
    ) -> Result<()> {
        let id = self.id.ok_or(Error::Released)?;
        let bytes: &[u8] = bytemuck::cast_slice(data);

        ctxt.device_mut()
            .upload_buffer(id, bytes, usage)
            .map_err(|e| Error::UploadFailed {
                bytes: bytes.len(),
                reason: e.to_string(),
            })?;

        self.size_in_bytes = bytes.len();
        self.usage = usage;
        Ok(())
    }

    /// Binds the buffer to its target.
    ///
    /// Binding a released buffer is a contract violation: it asserts in debug builds and
    /// returns `false` otherwise.
    pub fn bind<D: GraphicsDevice>(&self, ctxt: &mut Context<D>) -> bool {
        debug_assert!(self.id.is_some(), "binding a released GpuBuffer");

        match self.id {
            Some(id) => {
                ctxt.device_mut().bind_buffer(id, self.target);
                true
            }
            None => false,
        }
    }

    /// Gives the device buffer back. Further calls do nothing.
    pub fn release<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) {
        if let Some(id) = self.id.take() {
            ctxt.device_mut().destroy_buffer(id);
            self.tracker.released();
            self.size_in_bytes = 0;
        }
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            log::error!(
                "GpuBuffer {:?} dropped without release(); its device buffer leaks.",
                id
            );
            self.tracker.leak();
        }
    }
}
