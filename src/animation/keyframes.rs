use std::collections::BTreeMap;

use crate::{
    animation::anim::{PropertySet, Tween},
    foundation::core::Progress,
    foundation::error::{ReelError, ReelResult},
};

/// A tween placed on a normalized timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineEntry {
    /// Start position in timeline units.
    pub at: f64,
    /// Length in timeline units, > 0.
    pub duration: f64,
    /// Interpolated values; the tween's own driver is ignored.
    pub tween: Tween,
}

impl TimelineEntry {
    fn end(&self) -> f64 {
        self.at + self.duration
    }
}

/// Positioned tweens scrubbed together by one progress value.
///
/// Entries are composed in insertion order: once an entry has started, its values override
/// values written by earlier entries for the same target and property.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KeyframeTimeline {
    entries: Vec<TimelineEntry>,
}

impl KeyframeTimeline {
    /// Empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `tween` at absolute position `at`.
    pub fn insert(&mut self, at: f64, duration: f64, tween: Tween) -> ReelResult<()> {
        if !at.is_finite() || at < 0.0 {
            return Err(ReelError::validation(format!(
                "timeline position for '{}' must be finite and >= 0, got {at}",
                tween.target
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ReelError::validation(format!(
                "timeline duration for '{}' must be finite and > 0, got {duration}",
                tween.target
            )));
        }
        tween.validate()?;
        self.entries.push(TimelineEntry {
            at,
            duration,
            tween,
        });
        Ok(())
    }

    /// Place `tween` relative to the current end (`gap` may be negative, e.g. `-=1`).
    pub fn append(&mut self, gap: f64, duration: f64, tween: Tween) -> ReelResult<()> {
        let at = (self.duration() + gap).max(0.0);
        self.insert(at, duration, tween)
    }

    /// Total length in timeline units.
    pub fn duration(&self) -> f64 {
        self.entries.iter().map(TimelineEntry::end).fold(0.0, f64::max)
    }

    /// Borrow entries in insertion order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Sample every target at progress `p`.
    ///
    /// Before an entry starts it contributes its `from` values only for properties no earlier
    /// entry has written.
    pub fn sample(&self, p: Progress) -> BTreeMap<String, PropertySet> {
        let total = self.duration();
        let time = p.get() * total;
        let mut out: BTreeMap<String, PropertySet> = BTreeMap::new();

        for entry in &self.entries {
            let props = out.entry(entry.tween.target.clone()).or_default();
            if time < entry.at {
                for (name, v) in entry.tween.from.iter() {
                    if props.get(name).is_none() {
                        props.set(name, v);
                    }
                }
                continue;
            }
            let local = Progress::new((time - entry.at) / entry.duration);
            props.merge_from(&entry.tween.sample_at_progress(local).props);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;
