use super::*;

fn fade_in() -> Tween {
    Tween::scrubbed(
        "title",
        PropertySet::from([("opacity", 0.0), ("y", 100.0)]),
        PropertySet::from([("opacity", 1.0), ("y", 0.0)]),
        Ease::Linear,
    )
}

#[test]
fn progress_tween_interpolates_linearly() {
    let s = fade_in().sample_at_progress(Progress::new(0.25));
    assert_eq!(s.props.get("opacity"), Some(0.25));
    assert_eq!(s.props.get("y"), Some(75.0));
    assert!(!s.complete);
    assert!(fade_in().sample_at_progress(Progress::END).complete);
}

#[test]
fn sampling_is_referentially_transparent() {
    let t = fade_in();
    let a = t.sample_at_progress(Progress::new(0.6));
    let b = t.sample_at_progress(Progress::new(0.6));
    assert_eq!(a, b);
}

#[test]
fn one_sided_properties_hold_their_value() {
    let a = PropertySet::from([("x", 0.0), ("only_a", 3.0)]);
    let b = PropertySet::from([("x", 10.0), ("only_b", 7.0)]);
    let mid = PropertySet::lerp(&a, &b, 0.5);
    assert_eq!(mid.get("x"), Some(5.0));
    assert_eq!(mid.get("only_a"), Some(3.0));
    assert_eq!(mid.get("only_b"), Some(7.0));
}

#[test]
fn duration_tween_samples_by_time_and_completes() {
    let mut t = fade_in();
    t.driver = TweenDriver::Duration { secs: 2.0 };
    t.validate().unwrap();
    let half = t.sample_at_time(1.0).unwrap();
    assert_eq!(half.props.get("opacity"), Some(0.5));
    assert!(t.sample_at_time(5.0).unwrap().complete);
}

#[test]
fn progress_tween_rejects_time_sampling() {
    assert!(fade_in().sample_at_time(1.0).is_err());
}

#[test]
fn validate_rejects_bad_values() {
    let mut t = fade_in();
    t.driver = TweenDriver::Duration { secs: 0.0 };
    assert!(t.validate().is_err());

    let t = Tween::scrubbed(
        "x",
        PropertySet::new().with("scale", f64::INFINITY),
        PropertySet::new(),
        Ease::Linear,
    );
    assert!(t.validate().is_err());
}
