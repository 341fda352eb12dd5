//! Structures and helpers turning accumulated geometry into device draws.

pub use self::batch_renderer::{BatchRenderer, DrawPath, RenderStats};
pub use self::primitives::{
    cubic_bezier, draw_bezier, draw_circle, draw_line, draw_rectangle, fill_circle,
    fill_rectangle,
};

mod batch_renderer;
pub mod primitives;
