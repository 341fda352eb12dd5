//! Graphics device contract and the device-state context.

pub use self::attributes::{AttributeResolver, ShaderAttributes};
pub use self::context::{BlendMode, BufferTracker, Context};
pub use self::device::{
    AttributeFormat, AttributeSlot, BufferId, DeviceCapabilities, GraphicsDevice, PrimitiveMode,
    ScalarKind,
};
pub use self::recording_device::{DeviceCommand, RecordingDevice};
pub use self::wgpu_device::{DrawCall, ImmediateVertex, IndexSource, VertexSource, WgpuDevice};

mod attributes;
mod context;
mod device;
mod recording_device;
mod wgpu_device;
