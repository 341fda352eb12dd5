//! Legacy batch uploading positions, texture coordinates and colors to separate buffers.

use crate::color::{self, Color};
use crate::context::{Context, GraphicsDevice};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rectangle};
use crate::resource::{BatchSettings, BufferTarget, GpuBuffer};

/// Points accumulated as three parallel sequences.
///
/// Every `add_*` call appends to the three sequences at once, so they always have the same
/// length. [`Batch::apply`] uploads them to three buffers: positions and texture
/// coordinates as two `i32` per point, colors as one packed word per point (see
/// [`color::pack_rgba`]).
///
/// Rectangles are stored as four points in fan order and must be drawn with
/// [`PrimitiveMode::Quads`](crate::context::PrimitiveMode::Quads) or as a fan.
pub struct Batch {
    positions: Vec<Point>,
    tex_coords: Vec<Point>,
    colors: Vec<u32>,
    buffers: [GpuBuffer; 3],
}

impl Batch {
    /// Creates an empty batch with the default settings.
    pub fn new<D: GraphicsDevice>(ctxt: &mut Context<D>) -> Result<Self> {
        Self::with_settings(ctxt, BatchSettings::default())
    }

    /// Creates an empty batch and acquires its three buffers.
    pub fn with_settings<D: GraphicsDevice>(
        ctxt: &mut Context<D>,
        settings: BatchSettings,
    ) -> Result<Self> {
        let mut positions = GpuBuffer::new(ctxt, BufferTarget::Array, settings.usage)?;
        let mut tex_coords = match GpuBuffer::new(ctxt, BufferTarget::Array, settings.usage) {
            Ok(buffer) => buffer,
            Err(e) => {
                positions.release(ctxt);
                return Err(e);
            }
        };
        let colors = match GpuBuffer::new(ctxt, BufferTarget::Array, settings.usage) {
            Ok(buffer) => buffer,
            Err(e) => {
                positions.release(ctxt);
                tex_coords.release(ctxt);
                return Err(e);
            }
        };

        Ok(Batch {
            positions: Vec::new(),
            tex_coords: Vec::new(),
            colors: Vec::new(),
            buffers: [positions, tex_coords, colors],
        })
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    #[inline]
    pub fn tex_coords(&self) -> &[Point] {
        &self.tex_coords
    }

    /// Packed colors, one per point.
    #[inline]
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// The position, texture coordinate and color buffers, in that order.
    #[inline]
    pub fn buffers(&self) -> &[GpuBuffer; 3] {
        &self.buffers
    }

    /// Appends a textured point.
    pub fn add_point(&mut self, position: Point, color: Color, tex_coord: Point) {
        self.positions.push(position);
        self.tex_coords.push(tex_coord);
        self.colors.push(color::pack_rgba(color));
    }

    /// Appends a point textured at the origin.
    #[inline]
    pub fn add_colored_point(&mut self, position: Point, color: Color) {
        self.add_point(position, color, Point::ORIGIN);
    }

    /// Appends `dest` as four points: top-left, top-right, bottom-right, bottom-left.
    pub fn add_rectangle(&mut self, dest: Rectangle, color: Color, tex: Rectangle) {
        self.add_point(dest.top_left(), color, tex.top_left());
        self.add_point(dest.top_right(), color, tex.top_right());
        self.add_point(dest.bottom_right(), color, tex.bottom_right());
        self.add_point(dest.bottom_left(), color, tex.bottom_left());
    }

    /// Appends a segment as two untextured points.
    pub fn add_line(&mut self, from: Point, to: Point, color: Color) {
        self.add_colored_point(from, color);
        self.add_colored_point(to, color);
    }

    /// Removes every point, keeping the allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.tex_coords.clear();
        self.colors.clear();
    }

    /// Uploads the three sequences to their buffers.
    ///
    /// All three uploads are attempted even if one fails. Failures are logged and the first
    /// one is returned; callers that prefer to keep the frame going can ignore it.
    pub fn apply<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) -> Result<()> {
        let [positions, tex_coords, colors] = &mut self.buffers;
        let results = [
            ("positions", positions.upload(ctxt, &self.positions)),
            ("texture coordinates", tex_coords.upload(ctxt, &self.tex_coords)),
            ("colors", colors.upload(ctxt, &self.colors)),
        ];

        let mut first_error: Option<Error> = None;
        for (what, result) in results {
            if let Err(e) = result {
                log::warn!("Failed to upload batch {}: {}", what, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Gives the three buffers back to the device.
    pub fn release<D: GraphicsDevice>(&mut self, ctxt: &mut Context<D>) {
        for buffer in &mut self.buffers {
            buffer.release(ctxt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RecordingDevice;

    fn context() -> Context<RecordingDevice> {
        Context::new(RecordingDevice::new())
    }

    #[test]
    fn sequences_stay_parallel() {
        let mut ctxt = context();
        let mut batch = Batch::new(&mut ctxt).unwrap();
        batch.add_point(Point::new(1, 2), color::RED, Point::new(3, 4));
        batch.add_colored_point(Point::new(5, 6), color::LIME);
        batch.add_line(Point::new(0, 0), Point::new(9, 9), color::BLUE);
        batch.add_rectangle(
            Rectangle::new(0, 0, 4, 2),
            color::WHITE,
            Rectangle::new(0, 0, 1, 1),
        );

        assert_eq!(batch.len(), 8);
        assert_eq!(batch.tex_coords().len(), 8);
        assert_eq!(batch.colors().len(), 8);
        assert_eq!(batch.tex_coords()[1], Point::ORIGIN);

        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.tex_coords().is_empty());
        assert!(batch.colors().is_empty());
        batch.release(&mut ctxt);
    }

    #[test]
    fn rectangle_is_in_fan_order() {
        let mut ctxt = context();
        let mut batch = Batch::new(&mut ctxt).unwrap();
        batch.add_rectangle(
            Rectangle::new(0, 0, 10, 10),
            color::WHITE,
            Rectangle::new(0, 0, 1, 1),
        );

        assert_eq!(
            batch.positions(),
            &[
                Point::new(0, 0),
                Point::new(10, 0),
                Point::new(10, 10),
                Point::new(0, 10)
            ]
        );
        batch.release(&mut ctxt);
    }

    #[test]
    fn apply_uploads_three_buffers() {
        let mut ctxt = context();
        let mut batch = Batch::new(&mut ctxt).unwrap();
        batch.add_point(Point::new(1, 2), color::RED, Point::new(3, 4));
        batch.add_point(Point::new(-5, 6), color::BLUE, Point::new(7, 8));
        batch.apply(&mut ctxt).unwrap();

        let [p, t, c] = batch.buffers();
        let device = ctxt.device();
        assert_eq!(
            device.buffer_contents::<i32>(p.id().unwrap()),
            Some(vec![1, 2, -5, 6])
        );
        assert_eq!(
            device.buffer_contents::<i32>(t.id().unwrap()),
            Some(vec![3, 4, 7, 8])
        );
        assert_eq!(
            device.buffer_contents::<u32>(c.id().unwrap()),
            Some(vec![color::pack_rgba(color::RED), color::pack_rgba(color::BLUE)])
        );
        assert_eq!(c.size_in_bytes(), 8);
        batch.release(&mut ctxt);
    }

    #[test]
    fn failed_apply_reports_error() {
        let mut ctxt = context();
        let mut batch = Batch::new(&mut ctxt).unwrap();
        batch.add_colored_point(Point::new(1, 1), color::RED);
        ctxt.device_mut().set_reject_uploads(true);

        let result = batch.apply(&mut ctxt);
        assert!(matches!(result, Err(Error::UploadFailed { bytes: 8, .. })));
        assert_eq!(batch.len(), 1);
        batch.release(&mut ctxt);
    }

    #[test]
    fn partial_acquisition_is_rolled_back() {
        let mut ctxt = context();
        ctxt.device_mut().set_buffer_limit(Some(2));
        assert!(matches!(
            Batch::new(&mut ctxt),
            Err(Error::ResourceExhausted(_))
        ));
        assert_eq!(ctxt.buffer_tracker().live(), 0);
        assert_eq!(ctxt.device().buffer_count(), 0);
    }
}
