use super::*;
use crate::foundation::core::Progress;
use crate::player::loader::{DecodedImage, LoadFailure};
use crate::player::surface::PixmapSurface;

const DT: f64 = 1.0 / 60.0;

const SCENE: &str = r#"{
  "viewport": { "width": 100, "height": 100 },
  "elements": [
    { "name": "hero", "top": 0, "height": 100 },
    { "name": "section2", "top": 100, "height": 200 },
    { "name": "section3", "top": 300, "height": 400 }
  ],
  "scroll": { "smooth_wheel": false },
  "intro": { "has_intro_video": false, "has_scratch_surface": false },
  "sequence": {
    "pattern": "f{n}.png",
    "first": 0,
    "count": 10,
    "region": { "trigger": "section3", "start": "top top", "end": "bottom bottom", "pin": true }
  },
  "regions": [
    {
      "region": { "trigger": "section2", "start": "top top", "end": "bottom top" },
      "tweens": [ { "target": "line1", "from": { "opacity": 0 }, "to": { "opacity": 1 } } ]
    },
    {
      "region": { "trigger": "missing" },
      "tweens": [ { "target": "ghost", "to": { "opacity": 1 } } ]
    }
  ]
}"#;

struct Frames {
    fail_all: bool,
}

impl AssetLoader for Frames {
    fn fetch_image(&self, locator: &str) -> Result<DecodedImage, LoadFailure> {
        if self.fail_all {
            return Err(LoadFailure::Fetch {
                locator: locator.to_owned(),
                reason: "offline".to_owned(),
            });
        }
        Ok(DecodedImage::new(image::RgbaImage::from_pixel(
            16,
            9,
            image::Rgba([200, 10, 10, 255]),
        )))
    }
}

fn scene() -> SceneConfig {
    SceneConfig::from_reader(SCENE.as_bytes()).unwrap()
}

fn session(cfg: SceneConfig) -> ExperienceSession<PixmapSurface> {
    let surface = PixmapSurface::new(cfg.viewport).unwrap();
    ExperienceSession::new(cfg, surface).unwrap()
}

#[test]
fn regions_bind_only_after_intro_unlocks() {
    let mut cfg = scene();
    cfg.intro.has_intro_video = true;
    let mut s = session(cfg);
    s.start();
    assert_eq!(s.intro_state(), IntroState::Splash);
    assert!(s.driver().is_empty());
    assert!(s.scroll().is_locked());

    s.on_wheel(150.0);
    s.tick(DT);
    assert_eq!(s.scroll().current_offset(), 0.0);

    let entered = s.on_video_ended();
    assert_eq!(
        entered,
        vec![
            IntroState::ScratchReveal,
            IntroState::Revealed,
            IntroState::ScrollUnlocked
        ]
    );
    assert!(s.readiness().is_raised(Readiness::IntroUnlocked));
    assert_eq!(s.driver().len(), 1);
    assert!(!s.scroll().is_locked());
}

#[test]
fn failed_binding_does_not_stop_other_features() {
    let mut s = session(scene());
    s.start();
    assert_eq!(s.binding_errors().len(), 1);
    assert!(s.binding_errors()[0].contains("missing"));

    s.on_wheel(200.0);
    let report = s.tick(DT);
    assert_eq!(report.offset, 200.0);
    assert_eq!(report.properties["line1"].get("opacity"), Some(0.5));
    assert!(!report.properties.contains_key("ghost"));
}

#[test]
fn frame_follows_scroll_with_one_render_per_tick() {
    let mut s = session(scene());
    s.start();
    let report = s.load_frames(&Frames { fail_all: false }).unwrap();
    assert_eq!(report.loaded, 10);
    assert!(s.sequence_handle().is_some());

    let first = s.tick(DT);
    assert_eq!(first.frame, Some(0));
    assert!(first.rendered);
    // Pinned section3 adds its scroll distance to the scroll limit.
    assert_eq!(s.driver().total_pin_spacing(), 300.0);
    assert_eq!(s.scroll().limit(), 900.0);

    s.on_wheel(450.0);
    let mid = s.tick(DT);
    assert_eq!(mid.frame, Some(5));
    assert!(mid.rendered);
    let seq = mid
        .regions
        .iter()
        .find(|r| r.trigger == "section3")
        .unwrap();
    assert_eq!(seq.update.progress, Progress::new(0.5));

    let idle = s.tick(DT);
    assert!(!idle.rendered);
    assert_eq!(s.player().unwrap().stats().frames_drawn, 2);
}

#[test]
fn total_load_failure_keeps_timelines_running() {
    let mut s = session(scene());
    s.start();
    let err = s.load_frames(&Frames { fail_all: true }).unwrap_err();
    assert!(matches!(err, ReelError::TotalLoadFailure { requested: 10 }));
    assert!(!s.readiness().is_raised(Readiness::FramesLoaded));
    assert!(s.sequence_handle().is_none());

    s.on_wheel(100.0);
    let report = s.tick(DT);
    assert_eq!(report.frame, None);
    assert!(!report.rendered);
    assert_eq!(report.properties["line1"].get("opacity"), Some(0.0));
}

#[test]
fn resize_burst_collapses_into_one_recompute() {
    let mut s = session(scene());
    s.start();
    s.tick(DT);
    let before = s.driver().stats().recomputes;

    for h in [90.0, 95.0, 100.0, 120.0] {
        s.resize(Viewport::new(100.0, h, 1.0).unwrap()).unwrap();
    }
    s.tick(DT);
    assert_eq!(s.driver().stats().recomputes, before + 1);
    assert_eq!(s.layout().viewport().height, 120.0);
}

#[test]
fn content_mutation_recomputes_regions() {
    let mut s = session(scene());
    s.start();
    s.on_wheel(200.0);
    s.tick(DT);
    assert_eq!(s.properties()["line1"].get("opacity"), Some(0.5));

    s.set_element("section2", 200.0, 200.0);
    let report = s.tick(DT);
    assert_eq!(report.properties["line1"].get("opacity"), Some(0.0));
}

#[test]
fn teardown_unbinds_everything_and_is_idempotent() {
    let mut s = session(scene());
    s.start();
    s.load_frames(&Frames { fail_all: false }).unwrap();
    s.teardown();
    s.teardown();
    assert!(s.driver().is_empty());
    assert_eq!(s.tick(DT), TickReport::default());
}

#[test]
fn tilt_requires_binding_once() {
    let mut s = session(scene());
    assert_eq!(s.tilt_for(1.0, 0.0), None);
    assert!(s.bind_tilt());
    assert!(!s.bind_tilt());
    assert_eq!(s.tilt_for(1.0, 0.0), Some((15.0, 15.0)));
}

#[test]
fn navigate_to_scrolls_with_offset() {
    let mut s = session(scene());
    s.start();
    s.navigate_to("section2").unwrap();
    assert!(s.navigate_to("nowhere").is_err());
    for _ in 0..120 {
        s.tick(DT);
    }
    assert_eq!(s.scroll().current_offset(), 88.0);
}

#[test]
fn scratch_strokes_unlock_the_intro() {
    let mut cfg = scene();
    cfg.intro.has_scratch_surface = true;
    let mut s = session(cfg);
    assert_eq!(s.start(), vec![IntroState::ScratchReveal]);

    for row in [0.0, 50.0, 100.0] {
        s.pointer_down(0.0, row);
        s.pointer_move(100.0, row);
    }
    let report = s.tick(DT);
    assert_eq!(
        report.intro_entered,
        vec![IntroState::Revealed, IntroState::ScrollUnlocked]
    );
    assert!(s.pointer_up().is_empty());
}

#[test]
fn region_updates_arrive_through_bound_callbacks() {
    let mut s = session(scene());
    s.start();
    s.on_wheel(200.0);
    let first = s.tick(DT);
    assert_eq!(first.regions.len(), 1);
    assert_eq!(s.driver().stats().callbacks, 1);
    assert!(s.inbox.borrow().is_empty());

    // Unchanged progress: no callback, nothing reported.
    let idle = s.tick(DT);
    assert!(idle.regions.is_empty());
    assert_eq!(s.driver().stats().callbacks, 1);
}
