//! End-to-end behaviour of the orchestrator primitives against a manual
//! clock and a scripted viewport.

use klm_animation::{
    AmbientLoopMotion, CounterAnimation, CounterConfig, EnterTransition, Interpolation, LoopMotion,
    RevealTrigger, StaggerConfig, StaggeredGroupReveal, TimeInterpolator, ViewportTrigger,
};
use klm_core::{AnimationClock, Rect, SubjectId, Threshold, ViewportWatcher};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Stage {
    clock: Rc<AnimationClock>,
    watcher: Rc<ViewportWatcher>,
}

impl Stage {
    fn new() -> Self {
        Self {
            clock: Rc::new(AnimationClock::manual()),
            watcher: Rc::new(ViewportWatcher::new(1000.0, 1000.0)),
        }
    }

    fn place(&self, raw: u64, rect: Rect) -> SubjectId {
        let subject = SubjectId::new(raw);
        self.watcher.set_bounds(subject, rect);
        subject
    }

    /// Layout pass followed by an animation frame
    fn frame(&self, ms: f64) {
        self.watcher.refresh();
        self.clock.tick(ms);
    }
}

#[test]
fn test_subject_below_threshold_never_enters() {
    for &theta in &[0.05, 0.1, 0.25, 0.5, 0.75, 1.0] {
        let stage = Stage::new();
        // Peeks into the viewport by just under theta of its height
        let height = 200.0;
        let visible = height * theta * 0.9;
        let subject = stage.place(1, Rect::new(0.0, 1000.0 - visible, 100.0, height));

        let fired = Rc::new(Cell::new(false));
        let sink = fired.clone();
        let _trigger = ViewportTrigger::mount(
            stage.watcher.clone(),
            subject,
            Threshold::new(theta).unwrap(),
            move |_| sink.set(true),
        );
        let counter = CounterAnimation::mount(
            stage.clock.clone(),
            stage.watcher.clone(),
            subject,
            CounterConfig::new(100.0).threshold(Threshold::new(theta).unwrap()),
        );

        for _ in 0..300 {
            stage.frame(16.0);
        }

        assert!(!fired.get(), "theta {theta}");
        assert_eq!(counter.value(), 0.0);
    }
}

#[test]
fn test_entered_fires_at_most_once_under_oscillation() {
    let stage = Stage::new();
    let subject = stage.place(1, Rect::new(0.0, 900.0, 100.0, 200.0));

    let count = Rc::new(Cell::new(0));
    let sink = count.clone();
    let _trigger = ViewportTrigger::mount(
        stage.watcher.clone(),
        subject,
        Threshold::new(0.5).unwrap(),
        move |_| sink.set(sink.get() + 1),
    );

    for i in 0..100 {
        // Cycles through half visible, fully visible and hidden
        stage.watcher.scroll_to(match i % 3 {
            0 => 0.0,
            1 => 200.0,
            _ => -2000.0,
        });
        stage.frame(8.0);
    }

    assert_eq!(count.get(), 1);
}

#[test]
fn test_interpolation_ends_exactly_and_stays_in_range() {
    let cases = [
        (0.0, 100.0, 2000.0),
        (0.0, 80.0, 1500.0),
        (10.0, -3.5, 700.0),
        (-1.0, 1.0, 33.0),
        (5.0, 5.0, 100.0),
        (0.0, 0.3, 10_000.0),
    ];

    for (start, end, duration) in cases {
        for frame_ms in [7.0, 16.0, 33.3, 250.0] {
            let clock = Rc::new(AnimationClock::manual());
            let values = Rc::new(RefCell::new(Vec::new()));
            let sink = values.clone();
            let _handle = TimeInterpolator::run(
                clock.clone(),
                Interpolation::new(start, end, duration),
                move |tick| sink.borrow_mut().push(tick.value),
            );

            clock.run_for(duration + 2.0 * frame_ms, frame_ms);

            let values = values.borrow();
            let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
            assert_eq!(*values.last().unwrap(), end);
            assert!(values.iter().all(|v| (lo..=hi).contains(v)));
            assert!(!clock.has_pending());
        }
    }
}

#[test]
fn test_remount_cycles_leave_nothing_scheduled() {
    let stage = Stage::new();
    let subject = stage.place(1, Rect::new(0.0, 5000.0, 100.0, 100.0));
    let group_subject = stage.place(2, Rect::new(0.0, 6000.0, 100.0, 100.0));
    let fired = Rc::new(Cell::new(0));

    for _ in 0..10 {
        let sink = fired.clone();
        let trigger = ViewportTrigger::mount(
            stage.watcher.clone(),
            subject,
            Threshold::DEFAULT,
            move |_| sink.set(sink.get() + 1),
        );
        let counter = CounterAnimation::mount(
            stage.clock.clone(),
            stage.watcher.clone(),
            subject,
            CounterConfig::new(100.0),
        );
        let group = StaggeredGroupReveal::reveal(
            stage.clock.clone(),
            RevealTrigger::viewport(stage.watcher.clone(), group_subject),
            (10..15).map(SubjectId::new),
            StaggerConfig::new(100.0),
            EnterTransition::default(),
        );
        stage.frame(16.0);

        drop(group);
        drop(counter);
        drop(trigger);
    }

    assert_eq!(stage.watcher.observer_count(), 0);
    assert!(!stage.clock.has_pending());

    stage.watcher.scroll_to(5000.0);
    for _ in 0..100 {
        stage.frame(16.0);
    }
    assert_eq!(fired.get(), 0);
    assert_eq!(stage.clock.pending_count(), 0);
}

#[test]
fn test_stagger_of_five_items_at_100ms() {
    let stage = Stage::new();
    let group_subject = stage.place(1, Rect::new(0.0, 1500.0, 1000.0, 300.0));
    let starts = Rc::new(RefCell::new(Vec::new()));

    let sink = starts.clone();
    let group = StaggeredGroupReveal::reveal(
        stage.clock.clone(),
        RevealTrigger::viewport(stage.watcher.clone(), group_subject),
        (10..15).map(SubjectId::new),
        StaggerConfig::new(100.0),
        EnterTransition::fade_in_up(50.0),
    )
    .on_item_start(move |index, at| sink.borrow_mut().push((index, at)));

    // Uneven frame intervals, as a busy page would produce
    let intervals = [16.0, 33.0, 8.0, 50.0, 16.0, 17.0];
    for (i, ms) in intervals.iter().cycle().take(20).enumerate() {
        if i == 10 {
            stage.watcher.scroll_to(1000.0);
        }
        stage.frame(*ms);
    }

    let fired_at = group.fired_at().expect("group should have fired");
    for ms in intervals.iter().cycle().take(60) {
        stage.frame(*ms);
    }

    let starts = starts.borrow();
    assert_eq!(starts.iter().map(|s| s.0).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    let max_tick = 50.0;
    for &(i, at) in starts.iter() {
        let expected = fired_at + 100.0 * i as f64;
        assert!(
            at >= expected && at <= expected + max_tick,
            "item {i} started at {at}, expected {expected}"
        );
    }
    assert!(group.is_complete());
}

#[test]
fn test_counter_to_100_over_2000ms() {
    let stage = Stage::new();
    let subject = stage.place(1, Rect::new(0.0, 100.0, 200.0, 80.0));
    let counter = CounterAnimation::mount(
        stage.clock.clone(),
        stage.watcher.clone(),
        subject,
        CounterConfig::new(100.0).duration_ms(2000.0),
    );

    stage.watcher.refresh();
    stage.clock.run_for(1000.0, 16.0);
    assert!((counter.value() - 50.0).abs() <= 1.0);

    stage.clock.run_for(1000.0, 16.0);
    assert_eq!(counter.value(), 100.0);

    stage.watcher.scroll_to(3000.0);
    stage.frame(16.0);
    stage.watcher.scroll_to(0.0);
    stage.frame(16.0);
    stage.clock.run_for(2000.0, 16.0);
    assert_eq!(counter.value(), 100.0);
}

#[test]
fn test_loop_4000ms_amplitude_20() {
    let motion = LoopMotion::new(4000.0, 20.0);
    assert!(motion.position(0.0).abs() < 1e-9);
    assert!((motion.position(1000.0).abs() - 20.0).abs() < 1e-9);
    assert!(motion.position(4000.0).abs() < 1e-9);
    assert!((motion.position(41_000.0) - motion.position(1000.0)).abs() < 1e-9);

    let clock = Rc::new(AnimationClock::manual());
    let samples = Rc::new(RefCell::new(Vec::new()));
    let sink = samples.clone();
    let ambient =
        AmbientLoopMotion::start(clock.clone(), motion, move |y| sink.borrow_mut().push(y));

    for _ in 0..4 {
        clock.tick(1000.0);
    }
    let samples = samples.borrow();
    assert_eq!(samples.len(), 4);
    assert!((samples[0].abs() - 20.0).abs() < 1e-9);
    assert!(samples[3].abs() < 1e-9);
    assert!(ambient.is_running());
}

#[test]
fn test_sibling_loops_desynchronise() {
    let clock = Rc::new(AnimationClock::manual());
    let a = Rc::new(Cell::new(0.0));
    let b = Rc::new(Cell::new(0.0));

    let sink_a = a.clone();
    let _first = AmbientLoopMotion::start(clock.clone(), LoopMotion::new(4000.0, 20.0), move |v| {
        sink_a.set(v)
    });
    let sink_b = b.clone();
    let _second = AmbientLoopMotion::start(
        clock.clone(),
        LoopMotion::new(4000.0, 20.0).phase_offset(1000.0),
        move |v| sink_b.set(v),
    );

    clock.tick(1000.0);
    assert!((a.get() - b.get()).abs() > 1.0);
}
