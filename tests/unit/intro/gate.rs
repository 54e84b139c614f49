use super::*;

fn gate(config: IntroConfig) -> IntroGate {
    IntroGate::new(config).unwrap()
}

#[test]
fn video_end_moves_splash_to_scratch() {
    let mut g = gate(IntroConfig::default());
    assert!(g.start(0).is_empty());
    assert_eq!(g.handle(IntroEvent::VideoEnded, 1200), vec![IntroState::ScratchReveal]);
    assert_eq!(g.state(), IntroState::ScratchReveal);
    assert!(g.handle(IntroEvent::VideoEnded, 1300).is_empty());
}

#[test]
fn splash_times_out() {
    let mut g = gate(IntroConfig::default());
    g.start(1_000);
    assert!(g.advance(6_999).is_empty());
    assert_eq!(g.advance(7_000), vec![IntroState::ScratchReveal]);
    assert!(g.advance(20_000).is_empty());
}

#[test]
fn missing_video_ends_splash_at_start() {
    let mut g = gate(IntroConfig {
        has_intro_video: false,
        ..IntroConfig::default()
    });
    assert_eq!(g.start(0), vec![IntroState::ScratchReveal]);
}

#[test]
fn scratch_below_threshold_does_not_reveal() {
    let mut g = gate(IntroConfig::default());
    g.start(0);
    g.handle(IntroEvent::VideoEnded, 0);
    assert!(g.handle(IntroEvent::ScratchProgress(0.72), 10).is_empty());
    assert_eq!(
        g.handle(IntroEvent::ScratchProgress(0.73), 20),
        vec![IntroState::Revealed, IntroState::ScrollUnlocked]
    );
    assert!(g.is_unlocked());
}

#[test]
fn both_reveal_triggers_in_one_tick_transition_once() {
    let mut g = gate(IntroConfig {
        touch_primary: true,
        ..IntroConfig::default()
    });
    g.start(0);
    g.handle(IntroEvent::VideoEnded, 100);

    let mut entered = g.handle(IntroEvent::ScratchProgress(0.9), 600);
    entered.extend(g.advance(600));
    entered.extend(g.handle(IntroEvent::Skip, 600));
    assert_eq!(
        entered,
        vec![IntroState::Revealed, IntroState::ScrollUnlocked]
    );
}

#[test]
fn touch_primary_skips_after_delay() {
    let mut g = gate(IntroConfig {
        touch_primary: true,
        ..IntroConfig::default()
    });
    g.start(0);
    assert_eq!(g.advance(6_000), vec![IntroState::ScratchReveal]);
    assert!(g.advance(6_499).is_empty());
    assert_eq!(
        g.advance(6_500),
        vec![IntroState::Revealed, IntroState::ScrollUnlocked]
    );
}

#[test]
fn missing_scratch_surface_completes_reveal_with_splash() {
    let mut g = gate(IntroConfig {
        has_intro_video: false,
        has_scratch_surface: false,
        ..IntroConfig::default()
    });
    assert_eq!(
        g.start(0),
        vec![
            IntroState::ScratchReveal,
            IntroState::Revealed,
            IntroState::ScrollUnlocked
        ]
    );
}

#[test]
fn events_never_move_state_backward() {
    let mut g = gate(IntroConfig::default());
    g.start(0);
    assert!(g.handle(IntroEvent::Skip, 0).is_empty());
    assert!(g.handle(IntroEvent::ScratchProgress(1.0), 0).is_empty());
    assert_eq!(g.state(), IntroState::Splash);

    g.handle(IntroEvent::VideoEnded, 0);
    g.handle(IntroEvent::Skip, 0);
    for event in [IntroEvent::VideoEnded, IntroEvent::Skip, IntroEvent::ScratchProgress(1.0)] {
        assert!(g.handle(event, 1).is_empty());
        assert_eq!(g.state(), IntroState::ScrollUnlocked);
    }
}

#[test]
fn config_rejects_bad_threshold() {
    for t in [0.0, 1.5, f64::NAN] {
        let c = IntroConfig {
            clear_threshold: t,
            ..IntroConfig::default()
        };
        assert!(IntroGate::new(c).is_err());
    }
}

#[test]
fn revealed_is_reported_but_never_held() {
    let mut g = gate(IntroConfig::default());
    g.start(0);
    g.handle(IntroEvent::VideoEnded, 0);
    let entered = g.handle(IntroEvent::Skip, 10);
    assert!(entered.contains(&IntroState::Revealed));
    assert_eq!(g.state(), IntroState::ScrollUnlocked);
}
