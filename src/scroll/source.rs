use crate::{
    animation::ease::Ease,
    foundation::core::Direction,
    foundation::error::{ReelError, ReelResult},
    foundation::math::{damp, lerp},
};

/// Disposer token returned by [`ScrollSource::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Callback invoked with the new scroll offset.
pub type ScrollCallback = Box<dyn FnMut(f64)>;

/// Producer of a continuous virtual scroll offset.
///
/// Implementations invoke subscribers at most once per display-refresh tick.
pub trait ScrollSource {
    /// Feed a raw vertical delta in CSS pixels.
    fn on_scroll_delta(&mut self, delta_y: f64);
    /// Current (smoothed) offset in CSS pixels.
    fn current_offset(&self) -> f64;
    /// Register a callback for offset changes.
    fn subscribe(&mut self, callback: ScrollCallback) -> Subscription;
    /// Remove a callback. Returns `false` if it was already removed.
    fn unsubscribe(&mut self, sub: Subscription) -> bool;
}

/// Origin of a raw delta; each kind has its own multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Mouse wheel or trackpad.
    Wheel,
    /// Touch drag.
    Touch,
}

/// Tuning for [`SmoothScroll`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SmoothScrollOpts {
    /// Fraction of the remaining distance covered per 60 Hz frame, in `(0, 1]`.
    pub lerp: f64,
    /// Multiplier applied to wheel deltas.
    pub wheel_multiplier: f64,
    /// Multiplier applied to touch deltas.
    pub touch_multiplier: f64,
    /// When `false`, wheel input jumps straight to the target.
    pub smooth_wheel: bool,
    /// Distance (px) under which the animated offset snaps onto the target.
    pub settle_epsilon: f64,
}

impl Default for SmoothScrollOpts {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
            smooth_wheel: true,
            settle_epsilon: 0.01,
        }
    }
}

impl SmoothScrollOpts {
    /// Reject out-of-range tuning.
    pub fn validate(&self) -> ReelResult<()> {
        if !(self.lerp > 0.0 && self.lerp <= 1.0) {
            return Err(ReelError::validation(format!(
                "scroll lerp must be in (0, 1], got {}",
                self.lerp
            )));
        }
        if !self.wheel_multiplier.is_finite() || !self.touch_multiplier.is_finite() {
            return Err(ReelError::validation("scroll multipliers must be finite"));
        }
        if !self.settle_epsilon.is_finite() || self.settle_epsilon < 0.0 {
            return Err(ReelError::validation("settle_epsilon must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Programmatic scroll options, used by in-page navigation links.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollToOpts {
    /// Added to the destination (negative leaves room above the target).
    pub offset: f64,
    /// Animation length in seconds; `0` jumps immediately.
    pub duration_secs: f64,
    /// Easing of the programmatic animation.
    pub ease: Ease,
}

impl Default for ScrollToOpts {
    fn default() -> Self {
        Self {
            offset: -12.0,
            duration_secs: 1.35,
            ease: Ease::OutCubic,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ScrollToAnim {
    from: f64,
    to: f64,
    elapsed: f64,
    duration: f64,
    ease: Ease,
}

/// Damped smooth-scroll source.
///
/// Raw deltas move a target offset; every [`SmoothScroll::tick`] moves the animated offset a
/// frame-rate independent fraction of the remaining distance toward it.
pub struct SmoothScroll {
    opts: SmoothScrollOpts,
    limit: f64,
    target: f64,
    animated: f64,
    velocity: f64,
    direction: Direction,
    locked: bool,
    scroll_to: Option<ScrollToAnim>,
    subscribers: Vec<(Subscription, ScrollCallback)>,
    next_sub: u64,
    last_notified: Option<f64>,
}

impl std::fmt::Debug for SmoothScroll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmoothScroll")
            .field("opts", &self.opts)
            .field("limit", &self.limit)
            .field("target", &self.target)
            .field("animated", &self.animated)
            .field("velocity", &self.velocity)
            .field("locked", &self.locked)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SmoothScroll {
    /// Create a source scrolling within `[0, limit]`.
    pub fn new(opts: SmoothScrollOpts, limit: f64) -> ReelResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            limit: limit.max(0.0),
            target: 0.0,
            animated: 0.0,
            velocity: 0.0,
            direction: Direction::Idle,
            locked: false,
            scroll_to: None,
            subscribers: Vec::new(),
            next_sub: 0,
            last_notified: None,
        })
    }

    /// Update the scrollable extent after a layout change. Offsets are re-clamped.
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.target = self.target.clamp(0.0, self.limit);
        self.animated = self.animated.clamp(0.0, self.limit);
    }

    /// Maximum offset.
    pub fn limit(&self) -> f64 {
        self.limit
    }

    /// While locked, raw input is ignored (the page-level scroll lock).
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Whether raw input is currently ignored.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Feed a raw delta of the given kind.
    pub fn on_input(&mut self, kind: InputKind, delta_y: f64) {
        if self.locked || !delta_y.is_finite() {
            return;
        }
        let mult = match kind {
            InputKind::Wheel => self.opts.wheel_multiplier,
            InputKind::Touch => self.opts.touch_multiplier,
        };
        self.scroll_to = None;
        self.target = (self.target + delta_y * mult).clamp(0.0, self.limit);
        if kind == InputKind::Wheel && !self.opts.smooth_wheel {
            self.animated = self.target;
        }
    }

    /// Animate to `destination + opts.offset`.
    pub fn scroll_to(&mut self, destination: f64, opts: ScrollToOpts) {
        let to = (destination + opts.offset).clamp(0.0, self.limit);
        if opts.duration_secs <= 0.0 {
            self.scroll_to = None;
            self.target = to;
            self.animated = to;
            return;
        }
        self.target = to;
        self.scroll_to = Some(ScrollToAnim {
            from: self.animated,
            to,
            elapsed: 0.0,
            duration: opts.duration_secs,
            ease: opts.ease,
        });
    }

    /// Target the animated offset is moving toward.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Velocity of the animated offset in px/s measured over the last tick.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Direction of the last tick's movement.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// `true` while the animated offset has not reached its target.
    pub fn is_scrolling(&self) -> bool {
        self.animated != self.target || self.scroll_to.is_some()
    }

    /// Advance by `dt_secs`; subscribers are notified once if the offset differs from the last
    /// notified value.
    pub fn tick(&mut self, dt_secs: f64) -> f64 {
        let dt = if dt_secs.is_finite() {
            dt_secs.max(0.0)
        } else {
            0.0
        };
        let prev = self.animated;

        if let Some(mut anim) = self.scroll_to.take() {
            anim.elapsed += dt;
            let t = (anim.elapsed / anim.duration).min(1.0);
            self.animated = lerp(anim.from, anim.to, anim.ease.apply(t));
            if t < 1.0 {
                self.scroll_to = Some(anim);
            } else {
                self.animated = anim.to;
            }
        } else {
            self.animated = damp(self.animated, self.target, self.opts.lerp * 60.0, dt);
            if (self.animated - self.target).abs() <= self.opts.settle_epsilon {
                self.animated = self.target;
            }
        }

        self.velocity = if dt > 0.0 {
            (self.animated - prev) / dt
        } else {
            0.0
        };
        self.direction = Direction::between(prev, self.animated);

        if self.last_notified != Some(self.animated) {
            self.last_notified = Some(self.animated);
            let offset = self.animated;
            for (_, cb) in &mut self.subscribers {
                cb(offset);
            }
        }
        self.animated
    }
}

impl ScrollSource for SmoothScroll {
    fn on_scroll_delta(&mut self, delta_y: f64) {
        self.on_input(InputKind::Wheel, delta_y);
    }

    fn current_offset(&self) -> f64 {
        self.animated
    }

    fn subscribe(&mut self, callback: ScrollCallback) -> Subscription {
        let sub = Subscription(self.next_sub);
        self.next_sub += 1;
        self.subscribers.push((sub, callback));
        sub
    }

    fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != sub);
        before != self.subscribers.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/source.rs"]
mod tests;
