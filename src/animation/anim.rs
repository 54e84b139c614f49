use std::collections::BTreeMap;

use crate::{
    animation::ease::Ease,
    foundation::core::{Progress, Vec2},
    foundation::error::{ReelError, ReelResult},
    foundation::math::lerp,
};

/// Linear interpolation between two values of the same type.
pub trait Lerp: Sized {
    /// Interpolate from `a` (at `t = 0`) to `b` (at `t = 1`).
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        lerp(*a, *b, t)
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
    }
}

/// Named numeric style properties (`opacity`, `scale`, `y`, `skew_y`, ...).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PropertySet(BTreeMap<String, f64>);

impl PropertySet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or overwrite one property.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Read one property.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Iterate properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no property is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite properties of `self` with every property present in `other`.
    pub fn merge_from(&mut self, other: &PropertySet) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), *v);
        }
    }

    fn validate(&self) -> ReelResult<()> {
        for (k, v) in &self.0 {
            if !v.is_finite() {
                return Err(ReelError::validation(format!(
                    "property '{k}' must be finite, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Properties present on one side only hold that side's value.
impl Lerp for PropertySet {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let mut out = a.clone();
        for (k, bv) in &b.0 {
            let v = match a.0.get(k) {
                Some(av) => lerp(*av, *bv, t),
                None => *bv,
            };
            out.0.insert(k.clone(), v);
        }
        out
    }
}

impl<const N: usize> From<[(&str, f64); N]> for PropertySet {
    fn from(pairs: [(&str, f64); N]) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
    }
}

/// What advances a tween: wall-clock time or an external progress value.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TweenDriver {
    /// Plays over `secs` seconds of wall-clock time.
    Duration {
        /// Duration in seconds, > 0.
        secs: f64,
    },
    /// Scrubbed by an external progress value in `[0, 1]`.
    Progress,
}

/// A sampled tween state.
#[derive(Clone, Debug, PartialEq)]
pub struct TweenSample {
    /// Interpolated properties.
    pub props: PropertySet,
    /// `true` once the tween reached its end.
    pub complete: bool,
}

/// Interpolation of one target between two property sets.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tween {
    /// Logical name of the animated element.
    pub target: String,
    /// Start values.
    pub from: PropertySet,
    /// End values.
    pub to: PropertySet,
    /// Easing applied to normalized progress.
    #[serde(default)]
    pub ease: Ease,
    /// Clock or progress driver.
    pub driver: TweenDriver,
}

impl Tween {
    /// A scrubbed tween from `from` to `to`.
    pub fn scrubbed(
        target: impl Into<String>,
        from: PropertySet,
        to: PropertySet,
        ease: Ease,
    ) -> Self {
        Self {
            target: target.into(),
            from,
            to,
            ease,
            driver: TweenDriver::Progress,
        }
    }

    /// Check finite values and a positive duration.
    pub fn validate(&self) -> ReelResult<()> {
        self.from.validate()?;
        self.to.validate()?;
        if let TweenDriver::Duration { secs } = self.driver
            && (!secs.is_finite() || secs <= 0.0)
        {
            return Err(ReelError::validation(format!(
                "tween '{}' duration must be finite and > 0",
                self.target
            )));
        }
        Ok(())
    }

    /// Sample at normalized progress. Pure; the same input always yields the same output.
    pub fn sample_at_progress(&self, p: Progress) -> TweenSample {
        TweenSample {
            props: PropertySet::lerp(&self.from, &self.to, self.ease.apply(p.get())),
            complete: p == Progress::END,
        }
    }

    /// Sample at `elapsed_secs` since start.
    ///
    /// Progress-driven tweens cannot be sampled by time.
    pub fn sample_at_time(&self, elapsed_secs: f64) -> ReelResult<TweenSample> {
        match self.driver {
            TweenDriver::Duration { secs } => {
                Ok(self.sample_at_progress(Progress::new(elapsed_secs / secs)))
            }
            TweenDriver::Progress => Err(ReelError::validation(format!(
                "tween '{}' is progress-driven and has no duration",
                self.target
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
