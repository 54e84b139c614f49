use std::path::Path;

use anyhow::Context;
use image::{RgbaImage, imageops};

use crate::{
    foundation::core::{Rect, Rgba8, Size, Viewport},
    foundation::error::{ReelError, ReelResult},
    player::loader::DecodedImage,
};

/// Drawing target of the frame-sequence player. Coordinates are CSS pixels.
pub trait RenderSurface {
    /// Reallocate the backing store for `viewport` (size and DPR). Contents are cleared.
    fn resize(&mut self, viewport: Viewport) -> ReelResult<()>;
    /// Current size in CSS pixels.
    fn size(&self) -> Size;
    /// Fill the whole surface.
    fn fill(&mut self, color: Rgba8);
    /// Draw `image` scaled into `dest`.
    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) -> ReelResult<()>;
}

/// CPU RGBA8 pixmap sized in device pixels.
#[derive(Clone, Debug)]
pub struct PixmapSurface {
    viewport: Viewport,
    pixmap: RgbaImage,
    draws: u64,
}

impl PixmapSurface {
    /// Surface for `viewport`, cleared to transparent.
    pub fn new(viewport: Viewport) -> ReelResult<Self> {
        viewport.validate()?;
        let (w, h) = viewport.device_pixels();
        Ok(Self {
            viewport,
            pixmap: RgbaImage::new(w, h),
            draws: 0,
        })
    }

    /// Viewport the backing store was allocated for.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Backing pixels.
    pub fn pixmap(&self) -> &RgbaImage {
        &self.pixmap
    }

    /// Number of `draw_image` calls that reached the pixmap.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Encode the pixmap as PNG.
    pub fn save_png(&self, path: &Path) -> ReelResult<()> {
        self.pixmap
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png {}", path.display()))?;
        Ok(())
    }
}

impl RenderSurface for PixmapSurface {
    fn resize(&mut self, viewport: Viewport) -> ReelResult<()> {
        viewport.validate()?;
        let (w, h) = viewport.device_pixels();
        self.viewport = viewport;
        self.pixmap = RgbaImage::new(w, h);
        tracing::debug!(width = w, height = h, dpr = viewport.dpr, "pixmap reallocated");
        Ok(())
    }

    fn size(&self) -> Size {
        self.viewport.size()
    }

    fn fill(&mut self, color: Rgba8) {
        let px = image::Rgba(color.to_array());
        for p in self.pixmap.pixels_mut() {
            *p = px;
        }
    }

    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) -> ReelResult<()> {
        if !(dest.x0.is_finite() && dest.y0.is_finite() && dest.x1.is_finite() && dest.y1.is_finite())
        {
            return Err(ReelError::render(format!("non-finite destination rect {dest:?}")));
        }
        let dpr = self.viewport.dpr;
        let device = Rect::new(dest.x0 * dpr, dest.y0 * dpr, dest.x1 * dpr, dest.y1 * dpr).round();
        let (w, h) = (device.width().max(0.0) as u32, device.height().max(0.0) as u32);
        if w == 0 || h == 0 || image.width() == 0 || image.height() == 0 {
            return Ok(());
        }

        let scaled = if (w, h) == (image.width(), image.height()) {
            image.pixels().clone()
        } else {
            imageops::resize(image.pixels(), w, h, imageops::FilterType::Triangle)
        };
        imageops::overlay(&mut self.pixmap, &scaled, device.x0 as i64, device.y0 as i64);
        self.draws += 1;
        Ok(())
    }
}
