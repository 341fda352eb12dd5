//! Immediate-mode drawing helpers.
//!
//! These draw with the context's current color and transform, submitting vertices one by
//! one. They suit debug overlays and small amounts of geometry; sprites and tiles should go
//! through a [`Batch`](crate::resource::Batch) or a
//! [`DynamicVertexStore`](crate::resource::DynamicVertexStore).

use std::f32::consts::TAU;

use glamx::Vec2;

use crate::context::{Context, GraphicsDevice, PrimitiveMode};
use crate::error::{Error, Result};
use crate::geometry::Rect;

fn submit<D: GraphicsDevice>(ctxt: &mut Context<D>, mode: PrimitiveMode, points: &[Vec2]) {
    let color = ctxt.color();
    let transform = ctxt.transform();
    let device = ctxt.device_mut();

    device.begin(mode);
    for point in points {
        device.vertex(transform.transform_point2(*point), Vec2::ZERO, color);
    }
    device.end();
}

/// Draws a segment.
pub fn draw_line<D: GraphicsDevice>(ctxt: &mut Context<D>, from: Vec2, to: Vec2) {
    submit(ctxt, PrimitiveMode::Lines, &[from, to]);
}

/// Draws the outline of `rect`.
pub fn draw_rectangle<D: GraphicsDevice>(ctxt: &mut Context<D>, rect: Rect) {
    let corners = [
        rect.top_left(),
        rect.top_right(),
        rect.bottom_right(),
        rect.bottom_left(),
    ];
    submit(ctxt, PrimitiveMode::LineLoop, &corners);
}

/// Fills `rect`.
pub fn fill_rectangle<D: GraphicsDevice>(ctxt: &mut Context<D>, rect: Rect) {
    let corners = [
        rect.top_left(),
        rect.top_right(),
        rect.bottom_right(),
        rect.bottom_left(),
    ];
    submit(ctxt, PrimitiveMode::Quads, &corners);
}

/// Points evenly spread on a circle, starting at angle 0.
fn circle_points(center: Vec2, radius: f32, segments: u32) -> Result<Vec<Vec2>> {
    if segments < 3 {
        return Err(Error::InvalidArgument(format!(
            "a circle needs at least 3 segments, got {}",
            segments
        )));
    }

    Ok((0..segments)
        .map(|i| {
            let angle = TAU * i as f32 / segments as f32;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect())
}

/// Draws the outline of a circle approximated by `segments` segments.
pub fn draw_circle<D: GraphicsDevice>(
    ctxt: &mut Context<D>,
    center: Vec2,
    radius: f32,
    segments: u32,
) -> Result<()> {
    let points = circle_points(center, radius, segments)?;
    submit(ctxt, PrimitiveMode::LineLoop, &points);
    Ok(())
}

/// Fills a circle approximated by `segments` triangles.
pub fn fill_circle<D: GraphicsDevice>(
    ctxt: &mut Context<D>,
    center: Vec2,
    radius: f32,
    segments: u32,
) -> Result<()> {
    let rim = circle_points(center, radius, segments)?;
    let mut fan = Vec::with_capacity(rim.len() + 2);
    fan.push(center);
    fan.extend_from_slice(&rim);
    fan.push(rim[0]);
    submit(ctxt, PrimitiveMode::TriangleFan, &fan);
    Ok(())
}

/// Point at parameter `t` in [0, 1] of a cubic Bezier curve.
pub fn cubic_bezier(start: Vec2, control1: Vec2, control2: Vec2, end: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    start * (u * u * u)
        + control1 * (3.0 * u * u * t)
        + control2 * (3.0 * u * t * t)
        + end * (t * t * t)
}

/// Draws a cubic Bezier curve as `steps` segments.
pub fn draw_bezier<D: GraphicsDevice>(
    ctxt: &mut Context<D>,
    start: Vec2,
    control1: Vec2,
    control2: Vec2,
    end: Vec2,
    steps: u32,
) -> Result<()> {
    if steps == 0 {
        return Err(Error::InvalidArgument(
            "a curve needs at least one step".to_string(),
        ));
    }

    let points: Vec<Vec2> = (0..=steps)
        .map(|i| cubic_bezier(start, control1, control2, end, i as f32 / steps as f32))
        .collect();
    submit(ctxt, PrimitiveMode::LineStrip, &points);
    Ok(())
}
