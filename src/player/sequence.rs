use crate::{
    animation::mapper::frame_index,
    foundation::core::{Progress, Rgba8, Viewport},
    foundation::error::{ReelError, ReelResult},
    player::frame_set::FrameSet,
    player::letterbox::fit_rect,
    player::loader::{AssetLoader, LoadReport, load_all},
    player::surface::RenderSurface,
};

/// Fill behind letterboxed frames.
pub const DEFAULT_BACKGROUND: Rgba8 = Rgba8::BLACK;
/// Fill used when a frame cannot be drawn.
pub const FALLBACK_FILL: Rgba8 = Rgba8::opaque(0x1a, 0x1a, 0x1a);

/// Frame bookkeeping of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerState {
    /// Frame requested by the latest `set_frame`.
    pub current_frame: usize,
    /// Frame drawn by the latest render, if any.
    pub last_rendered_frame: Option<usize>,
    /// A render is pending for the next animation frame.
    pub render_scheduled: bool,
}

/// Render counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// `set_frame` calls accepted.
    pub frame_requests: u64,
    /// Renders that drew a frame.
    pub frames_drawn: u64,
    /// Renders that redrew an unchanged frame after invalidation.
    pub forced_redraws: u64,
    /// Renders skipped because the frame was already on screen.
    pub skipped: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Unloaded,
    Ready,
    Disabled,
}

/// Scroll-scrubbed frame-sequence player.
///
/// Owns the frame set and the surface. `set_frame` only records the request; the redraw
/// happens once per [`FrameSequencePlayer::on_animation_frame`], drawing whichever frame was
/// requested last.
#[derive(Debug)]
pub struct FrameSequencePlayer<S: RenderSurface> {
    surface: S,
    frames: FrameSet,
    state: PlayerState,
    invalidated: bool,
    lifecycle: Lifecycle,
    background: Rgba8,
    report: Option<LoadReport>,
    stats: RenderStats,
}

impl<S: RenderSurface> FrameSequencePlayer<S> {
    /// Player drawing into `surface`; frames arrive through [`FrameSequencePlayer::load`].
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            frames: FrameSet::default(),
            state: PlayerState::default(),
            invalidated: true,
            lifecycle: Lifecycle::Unloaded,
            background: DEFAULT_BACKGROUND,
            report: None,
            stats: RenderStats::default(),
        }
    }

    /// Player with an already decoded frame set.
    pub fn with_frames(surface: S, frames: FrameSet) -> Self {
        let mut player = Self::new(surface);
        player.install(frames);
        player
    }

    /// Builder: letterbox fill color.
    pub fn with_background(mut self, color: Rgba8) -> Self {
        self.background = color;
        self
    }

    /// Fetch all `locators` concurrently and install the frames that loaded.
    ///
    /// When nothing loads the player is disabled and every later call is a no-op.
    #[tracing::instrument(skip(self, loader, locators), fields(requested = locators.len()))]
    pub fn load(
        &mut self,
        loader: &dyn AssetLoader,
        locators: &[String],
        threads: Option<usize>,
    ) -> ReelResult<&LoadReport> {
        let (images, report) = load_all(loader, locators, threads)?;
        if images.is_empty() {
            tracing::error!(requested = report.requested, "no frame loaded; player disabled");
            self.lifecycle = Lifecycle::Disabled;
            self.report = Some(report);
            return Err(ReelError::TotalLoadFailure {
                requested: locators.len(),
            });
        }
        self.install(FrameSet::new(images));
        Ok(self.report.insert(report))
    }

    fn install(&mut self, frames: FrameSet) {
        self.frames = frames;
        self.lifecycle = Lifecycle::Ready;
        self.state = PlayerState {
            current_frame: 0,
            last_rendered_frame: None,
            render_scheduled: true,
        };
        self.invalidated = true;
    }

    /// Request `index` (clamped) for the next render. Ignored until frames are loaded.
    pub fn set_frame(&mut self, index: usize) {
        if self.lifecycle != Lifecycle::Ready {
            tracing::trace!(index, "set_frame ignored; player not ready");
            return;
        }
        self.state.current_frame = self.frames.clamp_index(index).unwrap_or(0);
        self.state.render_scheduled = true;
        self.stats.frame_requests += 1;
    }

    /// Request the frame for `progress` in the loaded sequence.
    pub fn set_progress(&mut self, progress: Progress) {
        if let Some(index) = frame_index(progress, self.frames.len()) {
            self.set_frame(index);
        }
    }

    /// Run the coalesced render, if one is scheduled. Returns `true` if a frame was drawn.
    pub fn on_animation_frame(&mut self) -> ReelResult<bool> {
        if !self.state.render_scheduled {
            return Ok(false);
        }
        self.state.render_scheduled = false;
        self.render()
    }

    /// Draw the current frame unless it is already on screen and nothing invalidated it.
    pub fn render(&mut self) -> ReelResult<bool> {
        if self.lifecycle != Lifecycle::Ready {
            return Ok(false);
        }
        let current = self.state.current_frame;
        if !self.invalidated && self.state.last_rendered_frame == Some(current) {
            self.stats.skipped += 1;
            return Ok(false);
        }

        let Some(image) = self.frames.get(current) else {
            self.surface.fill(FALLBACK_FILL);
            self.lifecycle = Lifecycle::Disabled;
            tracing::error!("render with an empty frame set; player disabled");
            return Err(ReelError::render("frame set is empty"));
        };

        self.surface.fill(self.background);
        let dest = fit_rect(image.size(), self.surface.size());
        if let Err(e) = self.surface.draw_image(image, dest) {
            self.surface.fill(FALLBACK_FILL);
            return Err(e);
        }

        if self.state.last_rendered_frame == Some(current) {
            self.stats.forced_redraws += 1;
        }
        self.state.last_rendered_frame = self.frames.clamp_index(current);
        self.invalidated = false;
        self.stats.frames_drawn += 1;
        Ok(true)
    }

    /// Reallocate the surface for `viewport`; the next animation frame redraws.
    pub fn resize(&mut self, viewport: Viewport) -> ReelResult<()> {
        self.surface.resize(viewport)?;
        self.invalidated = true;
        if self.lifecycle == Lifecycle::Ready {
            self.state.render_scheduled = true;
        }
        Ok(())
    }

    /// Frame bookkeeping.
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Number of loaded frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// `true` once frames are installed and the player has not been disabled.
    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    /// `true` after a total load failure or a render with no frames.
    pub fn is_disabled(&self) -> bool {
        self.lifecycle == Lifecycle::Disabled
    }

    /// Report of the latest `load`.
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    /// Render counters.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Drawing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
#[path = "../../tests/unit/player/sequence.rs"]
mod tests;
