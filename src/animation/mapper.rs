//! Pure progress-to-state mapping.
//!
//! Every function here is referentially transparent: the timeline driver re-invokes them on
//! layout recomputation without an intervening scroll and relies on identical results.

use crate::{
    animation::anim::{PropertySet, Tween},
    foundation::core::Progress,
};

/// Frame selected for `p` in a sequence of `frame_count` frames.
///
/// `round(p * (frame_count - 1))`, clamped into `[0, frame_count - 1]`. Returns `None` for an
/// empty sequence.
pub fn frame_index(p: Progress, frame_count: usize) -> Option<usize> {
    let last = frame_count.checked_sub(1)?;
    let idx = (p.get() * last as f64).round();
    Some((idx.max(0.0) as usize).min(last))
}

/// Interpolated properties of `tween` at `p`.
pub fn tween_props(tween: &Tween, p: Progress) -> PropertySet {
    tween.sample_at_progress(p).props
}

/// Maximum skew magnitude in degrees produced by [`velocity_skew`].
pub const MAX_VELOCITY_SKEW_DEG: f64 = 20.0;

/// Scroll velocity (px/s) to skew in degrees: `clamp(velocity / -300, -20, 20)`.
pub fn velocity_skew(velocity_px_per_sec: f64) -> f64 {
    if !velocity_px_per_sec.is_finite() {
        return 0.0;
    }
    (velocity_px_per_sec / -300.0).clamp(-MAX_VELOCITY_SKEW_DEG, MAX_VELOCITY_SKEW_DEG)
}

/// Pointer position inside an element (normalized to `[0, 1]²`) to `(rotate_x, rotate_y)`
/// degrees for the tilt effect.
pub fn tilt(pointer_x: f64, pointer_y: f64) -> (f64, f64) {
    let x = pointer_x.clamp(0.0, 1.0);
    let y = pointer_y.clamp(0.0, 1.0);
    ((y - 0.5) * -30.0, (x - 0.5) * 30.0)
}

/// Bound flag for an interactive tilt element.
///
/// Binding twice is a no-op.
#[derive(Debug, Default)]
pub struct TiltBinding {
    bound: bool,
}

impl TiltBinding {
    /// Mark the element bound. Returns `false` if it already was.
    pub fn bind(&mut self) -> bool {
        if self.bound {
            tracing::debug!("tilt effect already bound; skipping");
            return false;
        }
        self.bound = true;
        true
    }

    /// Whether [`TiltBinding::bind`] has succeeded before.
    pub fn is_bound(&self) -> bool {
        self.bound
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/mapper.rs"]
mod tests;
