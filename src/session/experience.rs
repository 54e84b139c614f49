use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{
    animation::anim::PropertySet,
    animation::keyframes::KeyframeTimeline,
    animation::mapper::{TiltBinding, tilt, velocity_skew},
    foundation::core::Viewport,
    foundation::error::{ReelError, ReelResult},
    intro::gate::{IntroEvent, IntroGate, IntroState},
    intro::scratch::ScratchMask,
    player::loader::{AssetLoader, LoadReport},
    player::sequence::FrameSequencePlayer,
    player::surface::RenderSurface,
    scroll::source::{InputKind, ScrollSource, ScrollToOpts, SmoothScroll},
    session::config::SceneConfig,
    session::readiness::{Readiness, ReadinessSet},
    timeline::driver::{RegionHandle, RegionUpdate, ScrollFrame, TickControl, TimelineDriver},
    timeline::region::{LayoutProvider, ScrollRegion, StaticLayout},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Binding {
    Sequence,
    Timeline(usize),
}

/// Updates delivered by region callbacks during the current tick, in delivery order.
type Inbox = Rc<RefCell<Vec<(Binding, RegionUpdate)>>>;

/// Update of one region, labelled with its trigger.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RegionReport {
    /// Trigger element of the region.
    pub trigger: String,
    /// Delivered update.
    #[serde(flatten)]
    pub update: RegionUpdate,
}

/// Everything that changed during one [`ExperienceSession::tick`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct TickReport {
    /// Tick counter, starting at 1.
    pub tick: u64,
    /// Session clock in milliseconds.
    pub time_ms: f64,
    /// Scroll offset after this tick.
    pub offset: f64,
    /// Scroll velocity in px/s.
    pub velocity: f64,
    /// Velocity skew for skew-on-scroll elements, in degrees.
    pub skew_deg: f64,
    /// Intro state after this tick.
    pub intro: IntroState,
    /// Intro states entered during this tick.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intro_entered: Vec<IntroState>,
    /// Region updates delivered this tick, in registration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionReport>,
    /// Targets whose properties changed this tick, with their current values.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySet>,
    /// Frame requested from the sequence player.
    pub frame: Option<usize>,
    /// Whether the player drew this tick.
    pub rendered: bool,
}

/// Owner of one page session: scroll source, timeline driver, frame player and intro gate.
///
/// Features start from readiness signals. Frame-sequence scrubbing waits for
/// [`Readiness::LayoutReady`] and [`Readiness::FramesLoaded`]; tween regions wait for
/// [`Readiness::LayoutReady`] and [`Readiness::IntroUnlocked`]. A feature that fails to start
/// is logged and skipped.
pub struct ExperienceSession<S: RenderSurface> {
    config: SceneConfig,
    layout: StaticLayout,
    scroll: SmoothScroll,
    driver: TimelineDriver,
    player: Option<FrameSequencePlayer<S>>,
    gate: IntroGate,
    scratch: Option<ScratchMask>,
    tilt: TiltBinding,
    readiness: ReadinessSet,
    timelines: Vec<KeyframeTimeline>,
    bindings: Vec<(RegionHandle, Binding)>,
    inbox: Inbox,
    binding_errors: Vec<String>,
    sequence_attempted: bool,
    timelines_attempted: bool,
    properties: BTreeMap<String, PropertySet>,
    pending_viewport: Option<Viewport>,
    clock_ms: f64,
    ticks: u64,
    started: bool,
    torn_down: bool,
}

impl<S: RenderSurface> std::fmt::Debug for ExperienceSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperienceSession")
            .field("intro", &self.gate.state())
            .field("offset", &self.scroll.current_offset())
            .field("regions", &self.bindings.len())
            .field("readiness", &self.readiness)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl<S: RenderSurface> ExperienceSession<S> {
    /// Validate `config` and assemble the session. `surface` is used only when the scene
    /// declares a frame sequence and should match the scene viewport.
    pub fn new(config: SceneConfig, surface: S) -> ReelResult<Self> {
        config.validate()?;
        let layout = config.layout();
        let mut scroll = SmoothScroll::new(config.scroll.clone(), 0.0)?;
        scroll.set_locked(true);

        let timelines = config
            .regions
            .iter()
            .map(|r| r.build_timeline())
            .collect::<ReelResult<Vec<_>>>()?;
        let player = config
            .sequence
            .as_ref()
            .map(|seq| FrameSequencePlayer::new(surface).with_background(seq.background));
        let gate = IntroGate::new(config.intro.clone())?;
        let scratch = if config.intro.has_scratch_surface {
            Some(ScratchMask::new(
                config.viewport,
                config.intro.stroke_width,
                config.intro.dot_radius,
            )?)
        } else {
            None
        };

        let mut session = Self {
            config,
            layout,
            scroll,
            driver: TimelineDriver::new(),
            player,
            gate,
            scratch,
            tilt: TiltBinding::default(),
            readiness: ReadinessSet::default(),
            timelines,
            bindings: Vec::new(),
            inbox: Inbox::default(),
            binding_errors: Vec::new(),
            sequence_attempted: false,
            timelines_attempted: false,
            properties: BTreeMap::new(),
            pending_viewport: None,
            clock_ms: 0.0,
            ticks: 0,
            started: false,
            torn_down: false,
        };
        session.update_scroll_limit();
        Ok(session)
    }

    /// Begin the intro and mark layout ready. Calling it again is a no-op.
    pub fn start(&mut self) -> Vec<IntroState> {
        if self.started || self.torn_down {
            return Vec::new();
        }
        self.started = true;
        self.readiness.raise(Readiness::LayoutReady);
        let entered = self.gate.start(self.now_ms());
        self.apply_intro(&entered);
        self.start_ready_features();
        entered
    }

    /// Load the scene's frame sequence through `loader`.
    ///
    /// A total load failure disables the player only; the rest of the session keeps running.
    pub fn load_frames(&mut self, loader: &dyn AssetLoader) -> ReelResult<LoadReport> {
        let seq = self
            .config
            .sequence
            .as_ref()
            .ok_or_else(|| ReelError::validation("scene has no frame sequence"))?;
        let locators = seq.locators()?;
        let threads = seq.threads;
        let player = self
            .player
            .as_mut()
            .ok_or_else(|| ReelError::validation("scene has no frame sequence"))?;

        match player.load(loader, &locators, threads).cloned() {
            Ok(report) => {
                self.readiness.raise(Readiness::FramesLoaded);
                self.start_ready_features();
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "frame sequence disabled");
                Err(e)
            }
        }
    }

    /// Advance one display-refresh tick.
    ///
    /// Order: intro timers, pending resize, scroll source, timeline driver (one coalesced
    /// recompute, then regions in registration order), mapped state into the player, and
    /// finally the player's coalesced render.
    pub fn tick(&mut self, dt_secs: f64) -> TickReport {
        if self.torn_down {
            return TickReport::default();
        }
        let dt = if dt_secs.is_finite() {
            dt_secs.max(0.0)
        } else {
            0.0
        };
        self.ticks += 1;
        self.clock_ms += dt * 1000.0;
        let now = self.now_ms();

        let mut intro_entered = self.gate.advance(now);
        if let Some(fraction) = self.scratch.as_mut().and_then(ScratchMask::take_check) {
            intro_entered.extend(self.gate.handle(IntroEvent::ScratchProgress(fraction), now));
        }
        self.apply_intro(&intro_entered);

        if let Some(viewport) = self.pending_viewport.take() {
            self.apply_resize(viewport);
        }

        let offset = self.scroll.tick(dt);
        let frame = ScrollFrame {
            offset,
            velocity: self.scroll.velocity(),
            direction: self.scroll.direction(),
            dt_secs: dt,
        };
        self.driver.tick(frame, &self.layout);
        self.update_scroll_limit();

        let delivered = std::mem::take(&mut *self.inbox.borrow_mut());
        let mut regions = Vec::with_capacity(delivered.len());
        let mut properties = BTreeMap::new();
        for (binding, update) in delivered {
            let Some(trigger) = self.trigger_of(binding) else {
                continue;
            };
            match binding {
                Binding::Sequence => {
                    if let Some(player) = self.player.as_mut() {
                        player.set_progress(update.progress);
                    }
                }
                Binding::Timeline(i) => {
                    if let Some(timeline) = self.timelines.get(i) {
                        for (target, props) in timeline.sample(update.progress) {
                            let current = self.properties.entry(target.clone()).or_default();
                            current.merge_from(&props);
                            properties.insert(target, current.clone());
                        }
                    }
                }
            }
            regions.push(RegionReport { trigger, update });
        }

        let mut rendered = false;
        let mut current_frame = None;
        if let Some(player) = self.player.as_mut() {
            rendered = player.on_animation_frame().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "frame render failed");
                false
            });
            if player.is_ready() {
                current_frame = Some(player.state().current_frame);
            }
        }

        TickReport {
            tick: self.ticks,
            time_ms: self.clock_ms,
            offset,
            velocity: frame.velocity,
            skew_deg: velocity_skew(frame.velocity),
            intro: self.gate.state(),
            intro_entered,
            regions,
            properties,
            frame: current_frame,
            rendered,
        }
    }

    /// Mouse wheel or trackpad delta.
    pub fn on_wheel(&mut self, delta_y: f64) {
        self.scroll.on_input(InputKind::Wheel, delta_y);
    }

    /// Touch drag delta.
    pub fn on_touch(&mut self, delta_y: f64) {
        self.scroll.on_input(InputKind::Touch, delta_y);
    }

    /// The intro video finished.
    pub fn on_video_ended(&mut self) -> Vec<IntroState> {
        self.intro_event(IntroEvent::VideoEnded)
    }

    /// Skip the scratch reveal.
    pub fn skip_intro(&mut self) -> Vec<IntroState> {
        self.intro_event(IntroEvent::Skip)
    }

    /// Pointer pressed on the scratch cover, in CSS pixels.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if self.gate.state() == IntroState::ScratchReveal
            && let Some(mask) = self.scratch.as_mut()
        {
            mask.pointer_down(x, y);
        }
    }

    /// Pointer moved over the scratch cover.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.gate.state() == IntroState::ScratchReveal
            && let Some(mask) = self.scratch.as_mut()
        {
            mask.pointer_move(x, y);
        }
    }

    /// Pointer released; the erased fraction is checked immediately.
    pub fn pointer_up(&mut self) -> Vec<IntroState> {
        let Some(fraction) = self.scratch.as_mut().map(ScratchMask::pointer_up) else {
            return Vec::new();
        };
        self.intro_event(IntroEvent::ScratchProgress(fraction))
    }

    /// Viewport change. Bursts within one tick collapse into a single recompute.
    pub fn resize(&mut self, viewport: Viewport) -> ReelResult<()> {
        viewport.validate()?;
        self.pending_viewport = Some(viewport);
        Ok(())
    }

    /// Move or insert a page block (content mutation); regions recompute on the next tick.
    pub fn set_element(&mut self, name: &str, top: f64, height: f64) {
        self.layout.set_element(name, top, height);
        self.driver.request_recompute();
    }

    /// Smooth-scroll to an element, as in-page navigation does.
    pub fn navigate_to(&mut self, element: &str) -> ReelResult<()> {
        let rect = self
            .layout
            .bounds(element)
            .ok_or_else(|| ReelError::validation(format!("unknown element '{element}'")))?;
        self.scroll.scroll_to(rect.y0, ScrollToOpts::default());
        Ok(())
    }

    /// Enable pointer tilt. Returns `false` if it was already enabled.
    pub fn bind_tilt(&mut self) -> bool {
        self.tilt.bind()
    }

    /// `(rotate_x, rotate_y)` degrees for a pointer at normalized element coordinates, if
    /// tilt is enabled.
    pub fn tilt_for(&self, pointer_x: f64, pointer_y: f64) -> Option<(f64, f64)> {
        self.tilt.is_bound().then(|| tilt(pointer_x, pointer_y))
    }

    /// Unbind every region and stop ticking. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        for (handle, _) in self.bindings.drain(..) {
            self.driver.unbind(handle);
        }
        self.inbox.borrow_mut().clear();
        self.scroll.set_locked(true);
        self.torn_down = true;
        tracing::info!(ticks = self.ticks, "session torn down");
    }

    /// Current intro state.
    pub fn intro_state(&self) -> IntroState {
        self.gate.state()
    }

    /// Readiness signals raised so far.
    pub fn readiness(&self) -> &ReadinessSet {
        &self.readiness
    }

    /// Scroll source.
    pub fn scroll(&self) -> &SmoothScroll {
        &self.scroll
    }

    /// Timeline driver.
    pub fn driver(&self) -> &TimelineDriver {
        &self.driver
    }

    /// Frame-sequence player, if the scene has a sequence.
    pub fn player(&self) -> Option<&FrameSequencePlayer<S>> {
        self.player.as_ref()
    }

    /// Current layout.
    pub fn layout(&self) -> &StaticLayout {
        &self.layout
    }

    /// Latest value of every animated property.
    pub fn properties(&self) -> &BTreeMap<String, PropertySet> {
        &self.properties
    }

    /// Handle of the frame-sequence region, once bound.
    pub fn sequence_handle(&self) -> Option<RegionHandle> {
        self.bindings
            .iter()
            .find(|(_, b)| *b == Binding::Sequence)
            .map(|(h, _)| *h)
    }

    /// Messages of regions that failed to bind.
    pub fn binding_errors(&self) -> &[String] {
        &self.binding_errors
    }

    fn now_ms(&self) -> u64 {
        self.clock_ms.round() as u64
    }

    fn intro_event(&mut self, event: IntroEvent) -> Vec<IntroState> {
        let entered = self.gate.handle(event, self.now_ms());
        self.apply_intro(&entered);
        entered
    }

    fn apply_intro(&mut self, entered: &[IntroState]) {
        if entered.contains(&IntroState::ScrollUnlocked) {
            self.scroll.set_locked(false);
            self.readiness.raise(Readiness::IntroUnlocked);
            self.start_ready_features();
        }
    }

    fn start_ready_features(&mut self) {
        if !self.sequence_attempted
            && self
                .readiness
                .all(&[Readiness::LayoutReady, Readiness::FramesLoaded])
        {
            self.sequence_attempted = true;
            if let Some(seq) = self.config.sequence.as_ref() {
                let region = seq.region.clone();
                self.bind_region(region, Binding::Sequence);
            }
        }

        if !self.timelines_attempted
            && self
                .readiness
                .all(&[Readiness::LayoutReady, Readiness::IntroUnlocked])
        {
            self.timelines_attempted = true;
            let regions: Vec<ScrollRegion> =
                self.config.regions.iter().map(|r| r.region.clone()).collect();
            for (i, region) in regions.into_iter().enumerate() {
                self.bind_region(region, Binding::Timeline(i));
            }
        }
        self.update_scroll_limit();
    }

    fn bind_region(&mut self, region: ScrollRegion, binding: Binding) {
        let trigger = region.trigger.clone();
        let inbox = Rc::clone(&self.inbox);
        let on_progress = move |update: &RegionUpdate, _: &mut TickControl| {
            inbox.borrow_mut().push((binding, *update));
        };
        match self.driver.bind(region, &self.layout, on_progress) {
            Ok(handle) => self.bindings.push((handle, binding)),
            Err(e) => {
                tracing::warn!(%trigger, error = %e, "scroll region not started");
                self.binding_errors.push(e.to_string());
            }
        }
    }

    fn trigger_of(&self, binding: Binding) -> Option<String> {
        let region = match binding {
            Binding::Sequence => &self.config.sequence.as_ref()?.region,
            Binding::Timeline(i) => &self.config.regions.get(i)?.region,
        };
        Some(region.trigger.clone())
    }

    fn apply_resize(&mut self, viewport: Viewport) {
        self.layout.set_viewport(viewport);
        self.driver.request_recompute();
        if let Some(player) = self.player.as_mut()
            && let Err(e) = player.resize(viewport)
        {
            tracing::warn!(error = %e, "player resize failed");
        }
        if let Some(mask) = self.scratch.as_mut()
            && let Err(e) = mask.resize(viewport)
        {
            tracing::warn!(error = %e, "scratch cover resize failed");
        }
        self.update_scroll_limit();
    }

    fn update_scroll_limit(&mut self) {
        let limit = self.layout.document_height() + self.driver.total_pin_spacing()
            - self.layout.viewport().height;
        if limit != self.scroll.limit() {
            self.scroll.set_limit(limit);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/experience.rs"]
mod tests;
