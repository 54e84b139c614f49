use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::foundation::core::Viewport;
use crate::timeline::region::{Criterion, StaticLayout};

fn layout() -> StaticLayout {
    StaticLayout::new(Viewport::new(1000.0, 800.0, 1.0).unwrap())
        .with_element("hero", 0.0, 800.0)
        .with_element("section2", 800.0, 1000.0)
        .with_element("section3", 1800.0, 1000.0)
}

fn crit(s: &str) -> Criterion {
    s.parse().unwrap()
}

fn frame(offset: f64) -> ScrollFrame {
    ScrollFrame {
        offset,
        velocity: 0.0,
        direction: Direction::Idle,
        dt_secs: 1.0 / 60.0,
    }
}

type Log = Rc<RefCell<Vec<(RegionHandle, f64)>>>;

fn recorder(log: &Log) -> impl FnMut(&RegionUpdate, &mut TickControl) + 'static {
    let log = Rc::clone(log);
    move |u, _| log.borrow_mut().push((u.handle, u.progress.get()))
}

#[test]
fn bind_fails_for_missing_trigger() {
    let mut d = TimelineDriver::new();
    let err = d
        .bind(ScrollRegion::new("nope"), &layout(), |_, _| {})
        .unwrap_err();
    assert!(matches!(err, ReelError::Binding(_)));
    assert!(d.is_empty());
}

#[test]
fn bind_rejects_invalid_region() {
    let mut d = TimelineDriver::new();
    let r = ScrollRegion::new("hero").scrub(f64::NAN);
    assert!(d.bind(r, &layout(), |_, _| {}).is_err());
}

#[test]
fn progress_is_clamped_and_linear() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(
            ScrollRegion::new("section2").between(crit("top top"), crit("bottom top")),
            &layout,
            |_, _| {},
        )
        .unwrap();
    assert_eq!(d.offsets(h), Some((800.0, 1800.0)));

    d.tick(frame(0.0), &layout);
    assert_eq!(d.progress(h), Some(Progress::START));
    d.tick(frame(1300.0), &layout);
    assert_eq!(d.progress(h), Some(Progress::new(0.5)));
    d.tick(frame(9000.0), &layout);
    assert_eq!(d.progress(h), Some(Progress::END));
}

#[test]
fn callbacks_only_fire_on_change() {
    let layout = layout();
    let log: Log = Rc::default();
    let mut d = TimelineDriver::new();
    d.bind(ScrollRegion::new("section2"), &layout, recorder(&log))
        .unwrap();

    d.tick(frame(100.0), &layout);
    d.tick(frame(100.0), &layout);
    d.tick(frame(100.0), &layout);
    assert_eq!(log.borrow().len(), 1);

    d.tick(frame(200.0), &layout);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn recompute_is_idempotent() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    d.bind(ScrollRegion::new("section2"), &layout, |_, _| {})
        .unwrap();
    d.bind(ScrollRegion::new("section3").pinned(), &layout, |_, _| {})
        .unwrap();
    d.tick(frame(1234.0), &layout);

    let first = d.recompute(&layout);
    let second = d.recompute(&layout);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn requests_are_coalesced_into_one_recompute_per_tick() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    d.bind(ScrollRegion::new("section2"), &layout, |_, _| {})
        .unwrap();

    for _ in 0..5 {
        d.request_recompute();
    }
    d.tick(frame(0.0), &layout);
    d.tick(frame(0.0), &layout);
    let stats = d.stats();
    assert_eq!(stats.recompute_requests, 5);
    assert_eq!(stats.recomputes, 1);
}

#[test]
fn regions_are_evaluated_in_registration_order() {
    let layout = layout();
    let log: Log = Rc::default();
    let mut d = TimelineDriver::new();
    let b = d
        .bind(ScrollRegion::new("section3"), &layout, recorder(&log))
        .unwrap();
    let a = d
        .bind(ScrollRegion::new("section2"), &layout, recorder(&log))
        .unwrap();

    d.tick(frame(1500.0), &layout);
    let order: Vec<_> = log.borrow().iter().map(|(h, _)| *h).collect();
    assert_eq!(order, vec![b, a]);
}

#[test]
fn unbind_from_callback_stops_later_deliveries_in_same_tick() {
    let layout = layout();
    let log: Log = Rc::default();
    let mut d = TimelineDriver::new();

    let victim = Rc::new(RefCell::new(None::<RegionHandle>));
    let target = Rc::clone(&victim);
    d.bind(ScrollRegion::new("section2"), &layout, move |_, ctl| {
        if let Some(h) = *target.borrow() {
            ctl.unbind(h);
        }
    })
    .unwrap();
    let second = d
        .bind(ScrollRegion::new("section3"), &layout, recorder(&log))
        .unwrap();
    *victim.borrow_mut() = Some(second);

    d.tick(frame(1500.0), &layout);
    assert!(log.borrow().is_empty());
    assert!(!d.is_bound(second));
    assert_eq!(d.len(), 1);
}

#[test]
fn pin_translation_is_continuous_across_boundaries() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(
            ScrollRegion::new("section2")
                .between(crit("top top"), crit("+=150%"))
                .pinned(),
            &layout,
            |_, _| {},
        )
        .unwrap();
    let (start, end) = d.offsets(h).unwrap();
    assert_eq!((start, end), (800.0, 2000.0));

    let eps = 1e-6;
    for boundary in [start, end] {
        let before = d.visual_top(h, boundary - eps).unwrap();
        let at = d.visual_top(h, boundary).unwrap();
        let after = d.visual_top(h, boundary + eps).unwrap();
        assert!((before - at).abs() < 1e-3);
        assert!((after - at).abs() < 1e-3);
    }
    // Held at the viewport top while pinned.
    assert!((d.visual_top(h, 1400.0).unwrap()).abs() < 1e-9);

    d.tick(frame(1400.0), &layout);
    assert_eq!(
        d.pin_state(h),
        Some(PinState::Pinned { translate_y: 600.0 })
    );
    d.tick(frame(5000.0), &layout);
    assert_eq!(
        d.pin_state(h),
        Some(PinState::Released {
            translate_y: 1200.0
        })
    );
}

#[test]
fn pinned_region_adds_spacing_for_regions_below() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    d.bind(
        ScrollRegion::new("section2")
            .between(crit("top top"), crit("+=100%"))
            .pinned(),
        &layout,
        |_, _| {},
    )
    .unwrap();
    let below = d
        .bind(
            ScrollRegion::new("section3").between(crit("top top"), crit("bottom top")),
            &layout,
            |_, _| {},
        )
        .unwrap();
    assert_eq!(d.total_pin_spacing(), 800.0);
    assert_eq!(d.offsets(below), Some((2600.0, 3600.0)));
}

#[test]
fn unbind_releases_pin_and_spacing() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(
            ScrollRegion::new("section2")
                .between(crit("top top"), crit("+=100%"))
                .pinned(),
            &layout,
            |_, _| {},
        )
        .unwrap();
    d.tick(frame(1000.0), &layout);
    assert!(matches!(d.pin_state(h), Some(PinState::Pinned { .. })));

    assert!(d.unbind(h));
    assert!(!d.unbind(h));
    assert_eq!(d.pin_state(h), None);
    assert_eq!(d.total_pin_spacing(), 0.0);
}

fn pin_and_region_below(
    d: &mut TimelineDriver,
    layout: &StaticLayout,
) -> (RegionHandle, RegionHandle) {
    let pin = d
        .bind(
            ScrollRegion::new("section2")
                .between(crit("top top"), crit("+=100%"))
                .pinned(),
            layout,
            |_, _| {},
        )
        .unwrap();
    let below = d
        .bind(
            ScrollRegion::new("section3").between(crit("top top"), crit("bottom top")),
            layout,
            |_, _| {},
        )
        .unwrap();
    (pin, below)
}

#[test]
fn unbinding_a_pin_restores_offsets_below_it() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let (pin, below) = pin_and_region_below(&mut d, &layout);
    d.tick(frame(0.0), &layout);
    assert_eq!(d.offsets(below), Some((2600.0, 3600.0)));

    assert!(d.unbind(pin));
    assert_eq!(d.total_pin_spacing(), 0.0);
    d.tick(frame(0.0), &layout);
    assert_eq!(d.offsets(below), Some((1800.0, 2800.0)));
    assert_eq!(d.total_pin_spacing(), 0.0);

    // The region below can now run to completion within the unpinned document.
    d.tick(frame(2800.0), &layout);
    assert_eq!(d.progress(below), Some(Progress::END));
}

#[test]
fn pin_unbound_from_its_callback_releases_spacing_below() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    d.bind(
        ScrollRegion::new("section2")
            .between(crit("top top"), crit("+=100%"))
            .pinned(),
        &layout,
        |u, control| control.unbind(u.handle),
    )
    .unwrap();
    let below = d
        .bind(
            ScrollRegion::new("section3").between(crit("top top"), crit("bottom top")),
            &layout,
            |_, _| {},
        )
        .unwrap();

    d.tick(frame(0.0), &layout);
    assert_eq!(d.len(), 1);
    assert_eq!(d.total_pin_spacing(), 0.0);

    let before = d.stats().recomputes;
    d.tick(frame(0.0), &layout);
    assert_eq!(d.stats().recomputes, before + 1);
    assert_eq!(d.offsets(below), Some((1800.0, 2800.0)));
}

#[test]
fn scrubbed_progress_never_increases_while_scrolling_backward() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(
            ScrollRegion::new("section2")
                .between(crit("top top"), crit("bottom top"))
                .scrub(1.0),
            &layout,
            |_, _| {},
        )
        .unwrap();
    d.recompute(&layout);
    for _ in 0..600 {
        d.tick(frame(1800.0), &layout);
    }
    assert_eq!(d.progress(h), Some(Progress::END));

    let mut last = d.progress(h).unwrap().get();
    let mut offset = 1800.0;
    for _ in 0..300 {
        offset = f64::max(offset - 5.0, 700.0);
        d.tick(
            ScrollFrame {
                direction: Direction::Backward,
                ..frame(offset)
            },
            &layout,
        );
        let p = d.progress(h).unwrap().get();
        assert!(p <= last, "progress rose from {last} to {p} at offset {offset}");
        last = p;
    }
    for _ in 0..600 {
        d.tick(frame(700.0), &layout);
    }
    assert_eq!(d.progress(h), Some(Progress::START));
}

#[test]
fn scrubbed_progress_lags_then_converges() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(
            ScrollRegion::new("section2")
                .between(crit("top top"), crit("bottom top"))
                .scrub(1.0),
            &layout,
            |_, _| {},
        )
        .unwrap();
    d.tick(frame(800.0), &layout);
    assert_eq!(d.progress(h), Some(Progress::START));

    d.tick(frame(1800.0), &layout);
    let lagging = d.progress(h).unwrap().get();
    assert!(lagging > 0.0 && lagging < 1.0);

    for _ in 0..600 {
        d.tick(frame(1800.0), &layout);
    }
    assert_eq!(d.progress(h), Some(Progress::END));
}

#[test]
fn recompute_snaps_scrubbed_progress() {
    let layout = layout();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(
            ScrollRegion::new("section2")
                .between(crit("top top"), crit("bottom top"))
                .scrub(2.0),
            &layout,
            |_, _| {},
        )
        .unwrap();
    d.tick(frame(800.0), &layout);
    d.tick(frame(1300.0), &layout);
    assert!(d.progress(h).unwrap().get() < 0.5);

    d.recompute(&layout);
    assert_eq!(d.progress(h), Some(Progress::new(0.5)));
}

#[test]
fn removed_trigger_deactivates_region_on_recompute() {
    let mut layout = layout();
    let log: Log = Rc::default();
    let mut d = TimelineDriver::new();
    let h = d
        .bind(ScrollRegion::new("section3"), &layout, recorder(&log))
        .unwrap();
    layout.remove_element("section3");
    let updates = d.recompute(&layout);
    assert!(updates.is_empty());
    assert_eq!(d.progress(h), None);
    assert!(d.is_bound(h));
}
