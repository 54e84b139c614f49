use super::*;
use crate::animation::ease::Ease;

#[test]
fn frame_index_is_monotone_and_bounded() {
    for n in [1usize, 2, 7, 87, 100] {
        let mut prev = 0usize;
        for step in 0..=1000 {
            let p = Progress::new(f64::from(step) / 1000.0);
            let idx = frame_index(p, n).unwrap();
            assert!(idx < n, "n={n} idx={idx}");
            assert!(idx >= prev, "not monotone at step {step}");
            prev = idx;
        }
        assert_eq!(frame_index(Progress::START, n), Some(0));
        assert_eq!(frame_index(Progress::END, n), Some(n - 1));
    }
}

#[test]
fn frame_index_rounds_to_nearest() {
    // 100 frames: p = 0.5 -> 49.5 -> 50.
    assert_eq!(frame_index(Progress::new(0.5), 100), Some(50));
    assert_eq!(frame_index(Progress::new(0.004), 100), Some(0));
    assert_eq!(frame_index(Progress::new(0.006), 100), Some(1));
}

#[test]
fn frame_index_of_empty_sequence_is_none() {
    assert_eq!(frame_index(Progress::new(0.3), 0), None);
}

#[test]
fn tween_props_matches_tween_sampling() {
    let t = Tween::scrubbed(
        "accent",
        PropertySet::from([("x", 0.0), ("skew_x", 0.0)]),
        PropertySet::from([("x", 10.0), ("skew_x", -6.0)]),
        Ease::Linear,
    );
    let p = tween_props(&t, Progress::new(0.5));
    assert_eq!(p.get("x"), Some(5.0));
    assert_eq!(p.get("skew_x"), Some(-3.0));
}

#[test]
fn velocity_skew_clamps() {
    assert_eq!(velocity_skew(0.0), 0.0);
    assert_eq!(velocity_skew(-3000.0), 10.0);
    assert_eq!(velocity_skew(300_000.0), -MAX_VELOCITY_SKEW_DEG);
    assert_eq!(velocity_skew(f64::NAN), 0.0);
}

#[test]
fn tilt_is_zero_at_center() {
    assert_eq!(tilt(0.5, 0.5), (0.0, 0.0));
    assert_eq!(tilt(1.0, 0.0), (15.0, 15.0));
}

#[test]
fn tilt_binding_guards_double_init() {
    let mut b = TiltBinding::default();
    assert!(b.bind());
    assert!(!b.bind());
    assert!(b.is_bound());
}
