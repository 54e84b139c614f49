use crate::foundation::error::{ReelError, ReelResult};

/// Phase of the intro sequence. Only ever moves forward.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IntroState {
    /// Splash video playing, page scroll locked.
    #[default]
    Splash,
    /// Scratch-off cover waiting to be cleared.
    ScratchReveal,
    /// Cover cleared or skipped. Transient: reported as entered, but the gate moves on to
    /// [`IntroState::ScrollUnlocked`] in the same step, so `state()` never returns it.
    Revealed,
    /// Scroll lock released; main scroll regions may bind. Terminal.
    ScrollUnlocked,
}

/// Input to the intro gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntroEvent {
    /// The splash video finished playing.
    VideoEnded,
    /// Latest erased fraction of the scratch cover, in `[0, 1]`.
    ScratchProgress(f64),
    /// Explicit request to skip the scratch reveal.
    Skip,
}

/// Intro thresholds and timings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    /// Erased fraction that must be exceeded to reveal.
    pub clear_threshold: f64,
    /// Splash ends after this long even if the video never reports its end.
    pub splash_timeout_ms: u64,
    /// On touch-primary devices the scratch step is skipped this long after the splash.
    pub touch_skip_delay_ms: u64,
    /// Primary pointer is coarse (touch).
    pub touch_primary: bool,
    /// An intro video exists; without one the splash ends at start.
    pub has_intro_video: bool,
    /// A scratch surface exists; without one the reveal completes at once.
    pub has_scratch_surface: bool,
    /// Width of erasing strokes in CSS pixels.
    pub stroke_width: f64,
    /// Radius of the dot erased at stroke start in CSS pixels.
    pub dot_radius: f64,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            clear_threshold: 0.72,
            splash_timeout_ms: 6000,
            touch_skip_delay_ms: 500,
            touch_primary: false,
            has_intro_video: true,
            has_scratch_surface: true,
            stroke_width: 140.0,
            dot_radius: 70.0,
        }
    }
}

impl IntroConfig {
    /// Reject thresholds outside `(0, 1]` and non-positive brush sizes.
    pub fn validate(&self) -> ReelResult<()> {
        if !(self.clear_threshold > 0.0 && self.clear_threshold <= 1.0) {
            return Err(ReelError::validation(format!(
                "intro clear_threshold must be in (0, 1], got {}",
                self.clear_threshold
            )));
        }
        if !(self.stroke_width > 0.0 && self.stroke_width.is_finite())
            || !(self.dot_radius > 0.0 && self.dot_radius.is_finite())
        {
            return Err(ReelError::validation(
                "intro stroke_width and dot_radius must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// One-shot intro state machine.
///
/// Time is injected as milliseconds since an arbitrary origin. Every method returns the states
/// entered by that call, in order, so callers react to each transition exactly once.
#[derive(Debug)]
pub struct IntroGate {
    config: IntroConfig,
    state: IntroState,
    splash_deadline_ms: Option<u64>,
    skip_due_ms: Option<u64>,
    reveal_latched: bool,
}

impl IntroGate {
    /// Gate in [`IntroState::Splash`].
    pub fn new(config: IntroConfig) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: IntroState::Splash,
            splash_deadline_ms: None,
            skip_due_ms: None,
            reveal_latched: false,
        })
    }

    /// Current state.
    pub fn state(&self) -> IntroState {
        self.state
    }

    /// `true` once the terminal state is reached.
    pub fn is_unlocked(&self) -> bool {
        self.state == IntroState::ScrollUnlocked
    }

    /// Configuration in use.
    pub fn config(&self) -> &IntroConfig {
        &self.config
    }

    /// Begin the splash at `now_ms`.
    pub fn start(&mut self, now_ms: u64) -> Vec<IntroState> {
        if self.state != IntroState::Splash || self.splash_deadline_ms.is_some() {
            return Vec::new();
        }
        if !self.config.has_intro_video {
            tracing::debug!("no intro video; ending splash immediately");
            return self.end_splash(now_ms);
        }
        self.splash_deadline_ms = Some(now_ms.saturating_add(self.config.splash_timeout_ms));
        Vec::new()
    }

    /// Fire timers due at `now_ms` (splash timeout, touch skip).
    pub fn advance(&mut self, now_ms: u64) -> Vec<IntroState> {
        let mut entered = Vec::new();
        if self.state == IntroState::Splash
            && let Some(deadline) = self.splash_deadline_ms
            && now_ms >= deadline
        {
            tracing::debug!(now_ms, "splash timeout");
            entered.extend(self.end_splash(now_ms));
        }
        if self.state == IntroState::ScratchReveal
            && let Some(due) = self.skip_due_ms
            && now_ms >= due
        {
            entered.extend(self.reveal("touch skip"));
        }
        entered
    }

    /// Apply an external event.
    pub fn handle(&mut self, event: IntroEvent, now_ms: u64) -> Vec<IntroState> {
        match (self.state, event) {
            (IntroState::Splash, IntroEvent::VideoEnded) => self.end_splash(now_ms),
            (IntroState::ScratchReveal, IntroEvent::ScratchProgress(fraction))
                if fraction > self.config.clear_threshold =>
            {
                self.reveal("scratch cleared")
            }
            (IntroState::ScratchReveal, IntroEvent::Skip) => self.reveal("skip"),
            _ => Vec::new(),
        }
    }

    fn end_splash(&mut self, now_ms: u64) -> Vec<IntroState> {
        self.splash_deadline_ms = None;
        self.state = IntroState::ScratchReveal;
        let mut entered = vec![IntroState::ScratchReveal];
        if !self.config.has_scratch_surface {
            entered.extend(self.reveal("no scratch surface"));
        } else if self.config.touch_primary {
            self.skip_due_ms = Some(now_ms.saturating_add(self.config.touch_skip_delay_ms));
        }
        entered
    }

    fn reveal(&mut self, cause: &str) -> Vec<IntroState> {
        if self.reveal_latched {
            return Vec::new();
        }
        self.reveal_latched = true;
        self.skip_due_ms = None;
        tracing::info!(cause, "intro revealed; scroll unlocked");
        self.state = IntroState::ScrollUnlocked;
        vec![IntroState::Revealed, IntroState::ScrollUnlocked]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/intro/gate.rs"]
mod tests;
