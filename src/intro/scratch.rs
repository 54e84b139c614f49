use image::{GrayImage, Luma};
use kurbo::{Line, ParamCurveNearest, Point, Rect};

use crate::{
    foundation::core::Viewport,
    foundation::error::{ReelError, ReelResult},
};

const COVERED: Luma<u8> = Luma([255]);
const CLEARED: Luma<u8> = Luma([0]);

/// Scratch-off cover: a coverage bitmap at device resolution erased by pointer strokes.
///
/// Pointer coordinates are CSS pixels relative to the cover. The erased fraction is checked at
/// most once per tick through [`ScratchMask::take_check`], plus once on pointer release.
#[derive(Clone, Debug)]
pub struct ScratchMask {
    coverage: GrayImage,
    dpr: f64,
    stroke_width: f64,
    dot_radius: f64,
    cleared: u64,
    drawing: bool,
    last: Option<Point>,
    check_queued: bool,
}

impl ScratchMask {
    /// Fully covered mask for `viewport`.
    pub fn new(viewport: Viewport, stroke_width: f64, dot_radius: f64) -> ReelResult<Self> {
        viewport.validate()?;
        if !(stroke_width > 0.0 && dot_radius > 0.0) {
            return Err(ReelError::validation(
                "scratch stroke width and dot radius must be > 0",
            ));
        }
        let (w, h) = viewport.device_pixels();
        Ok(Self {
            coverage: GrayImage::from_pixel(w, h, COVERED),
            dpr: viewport.dpr,
            stroke_width,
            dot_radius,
            cleared: 0,
            drawing: false,
            last: None,
            check_queued: false,
        })
    }

    /// Reallocate for a new viewport; the cover is restored.
    pub fn resize(&mut self, viewport: Viewport) -> ReelResult<()> {
        *self = Self::new(viewport, self.stroke_width, self.dot_radius)?;
        Ok(())
    }

    /// Start a stroke: erases a dot under the pointer.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drawing = true;
        self.last = None;
        self.pointer_move(x, y);
    }

    /// Continue the stroke with a round-capped segment from the previous point.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !self.drawing || !x.is_finite() || !y.is_finite() {
            return;
        }
        let p = Point::new(x, y);
        match self.last {
            Some(prev) => self.erase_segment(prev, p, self.stroke_width / 2.0),
            None => self.erase_segment(p, p, self.dot_radius),
        }
        self.last = Some(p);
        self.check_queued = true;
    }

    /// End the stroke. Returns the erased fraction, checked immediately.
    pub fn pointer_up(&mut self) -> f64 {
        self.drawing = false;
        self.last = None;
        self.check_queued = false;
        self.cleared_fraction()
    }

    /// Erased fraction if a check is queued since the last call.
    pub fn take_check(&mut self) -> Option<f64> {
        if !std::mem::take(&mut self.check_queued) {
            return None;
        }
        Some(self.cleared_fraction())
    }

    /// Share of device pixels erased, in `[0, 1]`.
    pub fn cleared_fraction(&self) -> f64 {
        let total = u64::from(self.coverage.width()) * u64::from(self.coverage.height());
        if total == 0 {
            return 0.0;
        }
        self.cleared as f64 / total as f64
    }

    /// Coverage bitmap (255 covered, 0 erased).
    pub fn coverage(&self) -> &GrayImage {
        &self.coverage
    }

    fn erase_segment(&mut self, a: Point, b: Point, radius: f64) {
        let dpr = self.dpr;
        let (a, b) = (Point::new(a.x * dpr, a.y * dpr), Point::new(b.x * dpr, b.y * dpr));
        let r = radius * dpr;
        let bounds = Rect::from_points(a, b).inflate(r, r);
        let (w, h) = (self.coverage.width(), self.coverage.height());
        let clamp = |v: f64, max: u32| v.clamp(0.0, f64::from(max)) as u32;
        let (x0, x1) = (clamp(bounds.x0.floor(), w), clamp(bounds.x1.ceil(), w));
        let (y0, y1) = (clamp(bounds.y0.floor(), h), clamp(bounds.y1.ceil(), h));

        let line = Line::new(a, b);
        let r2 = r * r;
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let d2 = if a == b {
                    (center - a).hypot2()
                } else {
                    line.nearest(center, 1e-6).distance_sq
                };
                if d2 <= r2 && *self.coverage.get_pixel(x, y) == COVERED {
                    self.coverage.put_pixel(x, y, CLEARED);
                    self.cleared += 1;
                }
            }
        }
    }
}
