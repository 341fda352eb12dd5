//! Device-state context.
//!
//! The context owns the graphics device together with the drawing state (current color,
//! blend mode, bound texture, transform stack and active shader attributes). It is passed
//! explicitly to every batching and draw call, so two contexts never share state.

use std::cell::Cell;
use std::rc::Rc;

use glamx::{Mat3, Vec2};

use crate::color::{self, Color};
use crate::context::{AttributeResolver, DeviceCapabilities, GraphicsDevice};

/// How drawn fragments are combined with the render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    /// Source over destination using the source alpha.
    #[default]
    Alpha,
    /// Source added to destination.
    Additive,
    /// Source multiplied with destination.
    Multiply,
    /// Source replaces destination.
    Replace,
}

impl BlendMode {
    /// Converts to a wgpu blend state. `Replace` disables blending.
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        match self {
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            }),
            BlendMode::Multiply => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Dst,
                    dst_factor: wgpu::BlendFactor::Zero,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            }),
            BlendMode::Replace => None,
        }
    }
}

/// Counts live and leaked buffer handles created through one context.
#[derive(Debug, Default)]
pub struct BufferTracker {
    live: Cell<usize>,
    leaked: Cell<usize>,
}

impl BufferTracker {
    /// Number of acquired buffers not yet released.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Number of buffers dropped without being released.
    pub fn leaked(&self) -> usize {
        self.leaked.get()
    }

    pub(crate) fn acquired(&self) {
        self.live.set(self.live.get() + 1);
    }

    pub(crate) fn released(&self) {
        self.live.set(self.live.get().saturating_sub(1));
    }

    pub(crate) fn leak(&self) {
        self.released();
        self.leaked.set(self.leaked.get() + 1);
    }
}

/// The device together with its drawing state.
pub struct Context<D: GraphicsDevice> {
    device: D,
    color: Color,
    blend_mode: BlendMode,
    texture: Option<u64>,
    transform: Mat3,
    saved_transforms: Vec<Mat3>,
    attributes: Option<Rc<dyn AttributeResolver>>,
    tracker: Rc<BufferTracker>,
}

impl<D: GraphicsDevice> Context<D> {
    /// Creates a context drawing on `device`, with a white color and identity transform.
    pub fn new(device: D) -> Self {
        Context {
            device,
            color: color::WHITE,
            blend_mode: BlendMode::default(),
            texture: None,
            transform: Mat3::IDENTITY,
            saved_transforms: Vec::new(),
            attributes: None,
            tracker: Rc::new(BufferTracker::default()),
        }
    }

    /// The underlying device.
    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The underlying device, mutably.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Consumes the context and returns its device.
    pub fn into_device(self) -> D {
        self.device
    }

    /// Shortcut for the device capabilities.
    #[inline]
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.device.capabilities()
    }

    /// Whether the device supports GPU-resident vertex buffers.
    #[inline]
    pub fn supports_hardware_buffers(&self) -> bool {
        self.capabilities()
            .contains(DeviceCapabilities::HARDWARE_BUFFERS)
    }

    /// Buffer bookkeeping of this context.
    #[inline]
    pub fn buffer_tracker(&self) -> &Rc<BufferTracker> {
        &self.tracker
    }

    /// The color used by immediate drawing primitives.
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Sets the color used by immediate drawing primitives.
    #[inline]
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// The current blend mode.
    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Sets the current blend mode.
    #[inline]
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    /// The texture currently bound, as an opaque texture id.
    #[inline]
    pub fn texture(&self) -> Option<u64> {
        self.texture
    }

    /// Binds a texture, or unbinds it with `None`.
    #[inline]
    pub fn set_texture(&mut self, texture: Option<u64>) {
        self.texture = texture;
    }

    /// The attribute resolver of the active shader, if any.
    #[inline]
    pub fn attributes(&self) -> Option<&dyn AttributeResolver> {
        self.attributes.as_deref()
    }

    /// Activates the attribute table of a shader, or deactivates it with `None`.
    pub fn use_attributes(&mut self, attributes: Option<Rc<dyn AttributeResolver>>) {
        self.attributes = attributes;
    }

    /// The current model transform.
    #[inline]
    pub fn transform(&self) -> Mat3 {
        self.transform
    }

    /// Replaces the current model transform.
    #[inline]
    pub fn set_transform(&mut self, transform: Mat3) {
        self.transform = transform;
    }

    /// Appends a translation to the current transform.
    pub fn translate(&mut self, offset: Vec2) {
        self.transform *= Mat3::from_translation(offset);
    }

    /// Appends a scale to the current transform.
    pub fn scale(&mut self, factors: Vec2) {
        self.transform *= Mat3::from_scale(factors);
    }

    /// Appends a rotation (in radians) to the current transform.
    pub fn rotate(&mut self, angle: f32) {
        self.transform *= Mat3::from_angle(angle);
    }

    /// Maps a point through the current transform.
    #[inline]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        self.transform.transform_point2(point)
    }

    /// Pushes the current transform on the state stack.
    pub fn save_state(&mut self) {
        self.saved_transforms.push(self.transform);
    }

    /// Pops the transform saved by the matching [`Self::save_state`].
    ///
    /// Returns `false` and keeps the current transform if nothing was saved.
    pub fn restore_state(&mut self) -> bool {
        match self.saved_transforms.pop() {
            Some(transform) => {
                self.transform = transform;
                true
            }
            None => {
                log::warn!("restore_state called without a matching save_state.");
                false
            }
        }
    }

    /// Depth of the state stack.
    #[inline]
    pub fn saved_states(&self) -> usize {
        self.saved_transforms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RecordingDevice, ShaderAttributes};

    #[test]
    fn contexts_do_not_share_state() {
        let mut a = Context::new(RecordingDevice::new());
        let b = Context::new(RecordingDevice::new());

        a.set_color(color::RED);
        a.set_blend_mode(BlendMode::Additive);
        a.set_texture(Some(7));

        assert_eq!(a.color(), color::RED);
        assert_eq!(b.color(), color::WHITE);
        assert_eq!(b.blend_mode(), BlendMode::Alpha);
        assert_eq!(b.texture(), None);
    }

    #[test]
    fn save_and_restore_transform() {
        let mut ctxt = Context::new(RecordingDevice::new());
        ctxt.save_state();
        ctxt.translate(Vec2::new(10.0, 5.0));
        assert_eq!(ctxt.transform_point(Vec2::ZERO), Vec2::new(10.0, 5.0));

        assert!(ctxt.restore_state());
        assert_eq!(ctxt.transform_point(Vec2::ZERO), Vec2::ZERO);
        assert!(!ctxt.restore_state());
        assert_eq!(ctxt.saved_states(), 0);
    }

    #[test]
    fn attributes_can_be_swapped() {
        let mut ctxt = Context::new(RecordingDevice::new());
        assert!(ctxt.attributes().is_none());

        ctxt.use_attributes(Some(Rc::new(ShaderAttributes::new().with("position", 3))));
        let location = ctxt
            .attributes()
            .and_then(|a| a.resolve_attribute_location("position"));
        assert_eq!(location, Some(3));

        ctxt.use_attributes(None);
        assert!(ctxt.attributes().is_none());
    }

    #[test]
    fn replace_blend_mode_disables_blending() {
        assert!(BlendMode::Replace.to_wgpu().is_none());
        assert_eq!(
            BlendMode::Alpha.to_wgpu(),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
    }
}
