//! Colors and their packed representation.
//!
//! Colors are RGBA with `f32` components in [0.0, 1.0]. Batches that upload colors as a
//! single 32-bit word use [`pack_rgba`], which lays the bytes out as R, G, B, A in memory,
//! the order read by a `Unorm8x4` vertex attribute.

pub use rgb::Rgba;

/// The color type used throughout dungeon2d. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// <div style="margin:2px 0"><span style="background-color:rgba(0, 0, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Transparent (0, 0, 0, 0)</div>
pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(0, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Black (0, 0, 0)</div>
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 255, 255);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>White (255, 255, 255)</div>
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Red (255, 0, 0)</div>
pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(0, 255, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Lime (0, 255, 0)</div>
pub const LIME: Color = Color::new(0.0, 1.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(0, 0, 255);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Blue (0, 0, 255)</div>
pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 255, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Yellow (255, 255, 0)</div>
pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(128, 128, 128);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Gray (128, 128, 128)</div>
pub const GRAY: Color = Color::new(0.5019608, 0.5019608, 0.5019608, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(139, 69, 19);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Saddle brown (139, 69, 19)</div>
pub const SADDLE_BROWN: Color = Color::new(0.54509807, 0.27058825, 0.07450981, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 215, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Gold (255, 215, 0)</div>
pub const GOLD: Color = Color::new(1.0, 0.84313726, 0.0, 1.0);

/// Builds a color from 8-bit channels.
#[inline]
pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Color {
    Color::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    )
}

/// Converts a channel to a byte, clamping out-of-range values.
#[inline]
fn channel_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Packs a color into one word whose little-endian bytes are R, G, B, A.
#[inline]
pub fn pack_rgba(color: Color) -> u32 {
    u32::from_le_bytes([
        channel_to_u8(color.r),
        channel_to_u8(color.g),
        channel_to_u8(color.b),
        channel_to_u8(color.a),
    ])
}

/// Inverse of [`pack_rgba`], up to 8-bit quantization.
#[inline]
pub fn unpack_rgba(packed: u32) -> Color {
    let [r, g, b, a] = packed.to_le_bytes();
    from_rgba8(r, g, b, a)
}
