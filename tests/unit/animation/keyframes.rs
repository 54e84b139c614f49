use super::*;
use crate::animation::ease::Ease;

fn scale_tween(from: f64, to: f64) -> Tween {
    Tween::scrubbed(
        "title",
        PropertySet::new().with("scale", from),
        PropertySet::new().with("scale", to),
        Ease::Linear,
    )
}

fn hero_like() -> KeyframeTimeline {
    let mut tl = KeyframeTimeline::new();
    tl.insert(0.0, 2.0, scale_tween(1.0, 1.8)).unwrap();
    tl.insert(1.0, 3.0, scale_tween(1.8, 100.0)).unwrap();
    tl
}

#[test]
fn duration_is_latest_entry_end() {
    assert_eq!(hero_like().duration(), 4.0);
}

#[test]
fn later_started_entries_override_earlier_ones() {
    let tl = hero_like();
    let at = |p: f64| tl.sample(Progress::new(p))["title"].get("scale").unwrap();
    assert_eq!(at(0.0), 1.0);
    assert!((at(0.125) - 1.2).abs() < 1e-9);
    assert!((at(0.5) - (1.8 + 98.2 / 3.0)).abs() < 1e-9);
    assert_eq!(at(1.0), 100.0);
}

#[test]
fn unstarted_entries_seed_missing_properties_with_from_values() {
    let mut tl = KeyframeTimeline::new();
    tl.insert(0.0, 1.0, scale_tween(1.0, 2.0)).unwrap();
    tl.insert(
        1.0,
        1.0,
        Tween::scrubbed(
            "title",
            PropertySet::new().with("opacity", 1.0),
            PropertySet::new().with("opacity", 0.0),
            Ease::Linear,
        ),
    )
    .unwrap();
    let s = tl.sample(Progress::START);
    assert_eq!(s["title"].get("opacity"), Some(1.0));
}

#[test]
fn append_uses_relative_gap() {
    let mut tl = KeyframeTimeline::new();
    tl.append(0.12, 0.9, scale_tween(0.0, 1.0)).unwrap();
    tl.append(0.12, 0.9, scale_tween(0.0, 1.0)).unwrap();
    assert!((tl.entries()[1].at - 1.14).abs() < 1e-9);
    tl.append(-5.0, 1.0, scale_tween(0.0, 1.0)).unwrap();
    assert_eq!(tl.entries()[2].at, 0.0);
}

#[test]
fn insert_rejects_non_positive_duration() {
    let mut tl = KeyframeTimeline::new();
    assert!(tl.insert(0.0, 0.0, scale_tween(0.0, 1.0)).is_err());
    assert!(tl.insert(-1.0, 1.0, scale_tween(0.0, 1.0)).is_err());
}
