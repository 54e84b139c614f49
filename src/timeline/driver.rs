use crate::{
    foundation::core::{Direction, Progress},
    foundation::error::{ReelError, ReelResult},
    foundation::math::{damp, inverse_lerp},
    timeline::region::{LayoutProvider, ScrollRegion},
};

/// Disposer token returned by [`TimelineDriver::bind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionHandle(u64);

/// Layout-lock state of a pinned region's trigger.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PinState {
    /// Not pinned, or scroll is before the region.
    Unpinned,
    /// Inside the region: the trigger is translated by `translate_y` to stay fixed.
    Pinned {
        /// Translation applied to the trigger, in CSS pixels.
        translate_y: f64,
    },
    /// Past the region: the trigger keeps its final translation and scrolls normally.
    Released {
        /// Translation applied to the trigger, in CSS pixels.
        translate_y: f64,
    },
}

impl PinState {
    /// Translation applied to the trigger.
    pub fn translate_y(self) -> f64 {
        match self {
            Self::Unpinned => 0.0,
            Self::Pinned { translate_y } | Self::Released { translate_y } => translate_y,
        }
    }
}

/// State delivered to a region callback.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RegionUpdate {
    /// Region this update belongs to.
    #[serde(skip)]
    pub handle: RegionHandle,
    /// Scrubbed progress (lags `raw_progress` when the region has a scrub).
    pub progress: Progress,
    /// Progress of the scroll position itself.
    pub raw_progress: Progress,
    /// Direction of the scroll movement this tick.
    pub direction: Direction,
    /// Scroll velocity in px/s.
    pub velocity: f64,
    /// `true` while the scroll position is strictly inside the region.
    pub is_active: bool,
    /// Pin state of the trigger.
    pub pin: PinState,
}

/// Per-tick control handed to callbacks.
#[derive(Debug, Default)]
pub struct TickControl {
    unbind: Vec<RegionHandle>,
}

impl TickControl {
    /// Unbind `handle` as soon as the current callback returns. The region receives no
    /// further callbacks, including later in the current tick.
    pub fn unbind(&mut self, handle: RegionHandle) {
        self.unbind.push(handle);
    }
}

/// Callback invoked with each progress update of a bound region.
pub type ProgressCallback = Box<dyn FnMut(&RegionUpdate, &mut TickControl)>;

/// Scroll state for one tick, as read from the scroll source.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollFrame {
    /// Scroll offset in CSS pixels.
    pub offset: f64,
    /// Velocity in px/s.
    pub velocity: f64,
    /// Movement direction.
    pub direction: Direction,
    /// Seconds since the previous tick.
    pub dt_secs: f64,
}

/// Counters for observability and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Layout recomputations executed.
    pub recomputes: u64,
    /// Recompute requests received (before coalescing).
    pub recompute_requests: u64,
    /// Callbacks invoked.
    pub callbacks: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Resolved {
    trigger_top: f64,
    start: f64,
    end: f64,
}

struct Slot {
    handle: RegionHandle,
    region: ScrollRegion,
    resolved: Option<Resolved>,
    smoothed: f64,
    snap: bool,
    delivered: Option<(Progress, PinState)>,
    callback: Option<ProgressCallback>,
    alive: bool,
}

/// Binds scroll regions to progress values and owns pin semantics.
///
/// Regions are evaluated in registration order on every tick; overlapping regions all
/// receive updates.
pub struct TimelineDriver {
    slots: Vec<Slot>,
    next_handle: u64,
    frame: ScrollFrame,
    pending_recompute: bool,
    pin_spacing: f64,
    stats: DriverStats,
}

impl std::fmt::Debug for TimelineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineDriver")
            .field("regions", &self.slots.len())
            .field("frame", &self.frame)
            .field("pending_recompute", &self.pending_recompute)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Default for TimelineDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineDriver {
    /// Driver with no regions at scroll offset 0.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_handle: 0,
            frame: ScrollFrame::default(),
            pending_recompute: false,
            pin_spacing: 0.0,
            stats: DriverStats::default(),
        }
    }

    /// Register `region`.
    ///
    /// Fails without registering anything when the region is invalid or its trigger cannot be
    /// resolved in `layout`. The first update is delivered on the next tick or recompute.
    pub fn bind<F>(
        &mut self,
        region: ScrollRegion,
        layout: &dyn LayoutProvider,
        on_progress: F,
    ) -> ReelResult<RegionHandle>
    where
        F: FnMut(&RegionUpdate, &mut TickControl) + 'static,
    {
        region.validate()?;
        let resolved = self.resolve(&region, layout).ok_or_else(|| {
            tracing::warn!(trigger = %region.trigger, "scroll region trigger not found");
            ReelError::binding(format!(
                "trigger '{}' could not be resolved",
                region.trigger
            ))
        })?;
        if resolved.end < resolved.start {
            return Err(ReelError::binding(format!(
                "region '{}' ends before it starts ({} < {})",
                region.trigger, resolved.end, resolved.start
            )));
        }

        let handle = RegionHandle(self.next_handle);
        self.next_handle += 1;
        if region.pin {
            self.pin_spacing += resolved.end - resolved.start;
            // Regions below the new pin shift down by its distance.
            self.pending_recompute = true;
        }
        tracing::debug!(
            trigger = %region.trigger,
            start = resolved.start,
            end = resolved.end,
            pin = region.pin,
            "bound scroll region"
        );
        let smoothed = raw_progress(&resolved, self.frame.offset).get();
        self.slots.push(Slot {
            handle,
            region,
            resolved: Some(resolved),
            smoothed,
            snap: true,
            delivered: None,
            callback: Some(Box::new(on_progress)),
            alive: true,
        });
        Ok(handle)
    }

    /// Remove a region. Any active pin is released immediately. Returns `false` for unknown
    /// or already unbound handles.
    ///
    /// Removing a pinned region also drops its spacing; regions below it are re-resolved
    /// without that spacing on the next tick.
    pub fn unbind(&mut self, handle: RegionHandle) -> bool {
        let Some(idx) = self.slots.iter().position(|s| s.handle == handle) else {
            return false;
        };
        let slot = self.slots.remove(idx);
        if slot.alive && slot.region.pin {
            self.pending_recompute = true;
        }
        self.recount_pin_spacing();
        tracing::debug!(?handle, "unbound scroll region");
        true
    }

    /// `true` while `handle` is bound.
    pub fn is_bound(&self, handle: RegionHandle) -> bool {
        self.slot(handle).is_some()
    }

    /// Coalesced recompute request, executed once at the start of the next tick.
    pub fn request_recompute(&mut self) {
        self.stats.recompute_requests += 1;
        self.pending_recompute = true;
    }

    /// Re-resolve every region against `layout` and deliver the resulting progress.
    ///
    /// Scrubbed progress snaps to the scroll position. Idempotent: recomputing again without a
    /// layout or scroll change yields identical updates.
    #[tracing::instrument(skip(self, layout))]
    pub fn recompute(&mut self, layout: &dyn LayoutProvider) -> Vec<RegionUpdate> {
        self.pending_recompute = false;
        self.resolve_all(layout);
        self.evaluate(0.0)
    }

    /// Advance one display-refresh tick.
    ///
    /// A pending recompute runs first, then regions are evaluated in registration order.
    /// Returns the updates delivered this tick.
    pub fn tick(&mut self, frame: ScrollFrame, layout: &dyn LayoutProvider) -> Vec<RegionUpdate> {
        self.frame = frame;
        if self.pending_recompute {
            self.pending_recompute = false;
            self.resolve_all(layout);
        }
        self.evaluate(frame.dt_secs)
    }

    /// Scrubbed progress of a bound, resolved region.
    pub fn progress(&self, handle: RegionHandle) -> Option<Progress> {
        let slot = self.slot(handle)?;
        slot.resolved?;
        Some(Progress::new(slot.smoothed))
    }

    /// Pin state of a bound region at the current scroll offset.
    pub fn pin_state(&self, handle: RegionHandle) -> Option<PinState> {
        let slot = self.slot(handle)?;
        let resolved = slot.resolved?;
        Some(pin_state(&slot.region, &resolved, self.frame.offset))
    }

    /// Top of the trigger relative to the viewport at scroll `offset`, with pinning applied.
    pub fn visual_top(&self, handle: RegionHandle, offset: f64) -> Option<f64> {
        let slot = self.slot(handle)?;
        let resolved = slot.resolved?;
        let translate = pin_state(&slot.region, &resolved, offset).translate_y();
        Some(resolved.trigger_top + translate - offset)
    }

    /// Resolved `(start, end)` scroll offsets of a region.
    pub fn offsets(&self, handle: RegionHandle) -> Option<(f64, f64)> {
        let resolved = self.slot(handle)?.resolved?;
        Some((resolved.start, resolved.end))
    }

    /// Extra scroll distance inserted by pinned regions.
    pub fn total_pin_spacing(&self) -> f64 {
        self.pin_spacing
    }

    /// Number of bound regions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when no region is bound.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Counters.
    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    fn slot(&self, handle: RegionHandle) -> Option<&Slot> {
        self.slots.iter().find(|s| s.handle == handle && s.alive)
    }

    /// Resolve `region` with pin spacing from pinned regions already bound above it.
    fn resolve(&self, region: &ScrollRegion, layout: &dyn LayoutProvider) -> Option<Resolved> {
        let vp = layout.viewport();
        let rect = layout.bounds(&region.trigger)?;
        let shift: f64 = self
            .slots
            .iter()
            .filter(|s| s.alive && s.region.pin && s.region.trigger != region.trigger)
            .filter_map(|s| {
                let r = s.resolved?;
                let pinned_rect = layout.bounds(&s.region.trigger)?;
                (pinned_rect.y1 <= rect.y0).then_some(r.end - r.start)
            })
            .sum();
        let rect = rect + kurbo::Vec2::new(0.0, shift);
        let (start, end) = region.offsets(rect, &vp);
        Some(Resolved {
            trigger_top: rect.y0,
            start,
            end,
        })
    }

    fn resolve_all(&mut self, layout: &dyn LayoutProvider) {
        self.stats.recomputes += 1;
        for slot in &mut self.slots {
            slot.resolved = None;
        }
        // Resolve in document order so pin spacing accumulates top to bottom.
        let mut order: Vec<(usize, f64)> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let top = layout.bounds(&s.region.trigger).map_or(f64::INFINITY, |r| r.y0);
                (i, top)
            })
            .collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (i, _) in order {
            let resolved = self
                .resolve(&self.slots[i].region, layout)
                .filter(|r| r.end >= r.start);
            let slot = &mut self.slots[i];
            if resolved.is_none() {
                tracing::warn!(
                    trigger = %slot.region.trigger,
                    "scroll region unresolved after layout change; deactivated"
                );
            }
            slot.resolved = resolved;
            slot.snap = true;
            slot.delivered = None;
        }
        self.recount_pin_spacing();
    }

    fn recount_pin_spacing(&mut self) {
        self.pin_spacing = self
            .slots
            .iter()
            .filter(|s| s.alive && s.region.pin)
            .filter_map(|s| s.resolved.map(|r| r.end - r.start))
            .sum();
    }

    fn evaluate(&mut self, dt_secs: f64) -> Vec<RegionUpdate> {
        let mut delivered = Vec::new();
        let frame = self.frame;

        for i in 0..self.slots.len() {
            let slot = &mut self.slots[i];
            if !slot.alive {
                continue;
            }
            let Some(resolved) = slot.resolved else {
                continue;
            };

            let raw = raw_progress(&resolved, frame.offset);
            if slot.snap || slot.region.scrub <= 0.0 {
                slot.smoothed = raw.get();
                slot.snap = false;
            } else {
                // Reaches ~95% of the remaining distance after `scrub` seconds.
                slot.smoothed = damp(slot.smoothed, raw.get(), 3.0 / slot.region.scrub, dt_secs);
                if (slot.smoothed - raw.get()).abs() < 1e-4 {
                    slot.smoothed = raw.get();
                }
            }

            let progress = Progress::new(slot.smoothed);
            let pin = pin_state(&slot.region, &resolved, frame.offset);
            if slot.delivered == Some((progress, pin)) {
                continue;
            }
            slot.delivered = Some((progress, pin));

            let update = RegionUpdate {
                handle: slot.handle,
                progress,
                raw_progress: raw,
                direction: frame.direction,
                velocity: frame.velocity,
                is_active: raw.is_inside(),
                pin,
            };

            let mut control = TickControl::default();
            if let Some(cb) = slot.callback.as_mut() {
                cb(&update, &mut control);
                self.stats.callbacks += 1;
            }
            delivered.push(update);

            for handle in control.unbind {
                if let Some(s) = self.slots.iter_mut().find(|s| s.handle == handle) {
                    s.alive = false;
                    s.callback = None;
                    tracing::debug!(?handle, "scroll region unbound from callback");
                }
            }
        }

        let before = self.slots.len();
        if self.slots.iter().any(|s| !s.alive && s.region.pin) {
            self.pending_recompute = true;
        }
        self.slots.retain(|s| s.alive);
        if before != self.slots.len() {
            self.recount_pin_spacing();
        }
        delivered
    }
}

fn raw_progress(resolved: &Resolved, offset: f64) -> Progress {
    Progress::new(inverse_lerp(resolved.start, resolved.end, offset))
}

/// Pin translation is continuous: at `offset == end` both the pinned and released branches
/// yield `end - start`.
fn pin_state(region: &ScrollRegion, resolved: &Resolved, offset: f64) -> PinState {
    if !region.pin || offset <= resolved.start {
        return PinState::Unpinned;
    }
    if offset >= resolved.end {
        return PinState::Released {
            translate_y: resolved.end - resolved.start,
        };
    }
    PinState::Pinned {
        translate_y: offset - resolved.start,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/driver.rs"]
mod tests;
