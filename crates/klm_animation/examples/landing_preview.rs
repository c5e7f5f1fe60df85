//! Landing Preview
//!
//! Mounts the whole landing page motion on a manual clock, scrolls through
//! the page and prints what each animation is doing along the way.
//!
//! Run with: cargo run -p klm_animation --example landing_preview [motion.toml]

use anyhow::{Context, Result};
use klm_animation::{LandingLayout, LandingMotion, MotionConfig};
use klm_core::{AnimationClock, Rect, SubjectId, ViewportWatcher};
use std::rc::Rc;

const VIEWPORT_WIDTH: f64 = 1280.0;
const VIEWPORT_HEIGHT: f64 = 720.0;
const FRAME_MS: f64 = 16.0;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => MotionConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => MotionConfig::default(),
    };

    let clock = Rc::new(AnimationClock::manual());
    let watcher = Rc::new(ViewportWatcher::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT));
    let layout = build_layout(&watcher);

    let landing = LandingMotion::mount(clock.clone(), watcher.clone(), &config, &layout)
        .context("mounting landing motion")?;
    let cta = landing.press();

    // Scroll down the page at a steady pace, one layout pass per frame
    let mut scroll = 0.0;
    for frame in 0..600u32 {
        if frame >= 120 && scroll < 2600.0 {
            scroll += 8.0;
            watcher.scroll_to(scroll);
        }
        if frame == 200 {
            cta.set_hovered(true);
        }
        if frame == 230 {
            cta.set_pressed(true);
        }
        if frame == 240 {
            cta.set_pressed(false);
        }

        watcher.refresh();
        clock.tick(FRAME_MS);

        if frame % 60 == 0 {
            report(&landing, frame, scroll, cta.scale());
        }
    }

    println!();
    println!(
        "fully revealed: {}, frames dispatched: {}",
        landing.is_fully_revealed(),
        clock.frames_run()
    );

    drop(cta);
    drop(landing);
    println!("pending after unmount: {}", clock.pending_count());

    Ok(())
}

fn build_layout(watcher: &ViewportWatcher) -> LandingLayout {
    let mut next = 0;
    let mut place = |rect: Rect| {
        next += 1;
        let subject = SubjectId::new(next);
        watcher.set_bounds(subject, rect);
        subject
    };

    let header = place(Rect::new(0.0, 0.0, VIEWPORT_WIDTH, 64.0));
    let hero: Vec<_> = (0..5)
        .map(|i| place(Rect::new(80.0, 140.0 + 60.0 * i as f64, 560.0, 48.0)))
        .collect();
    let stats: Vec<_> = (0..3)
        .map(|i| place(Rect::new(120.0 + 360.0 * i as f64, 900.0, 240.0, 96.0)))
        .collect();

    let categories = place(Rect::new(0.0, 1300.0, VIEWPORT_WIDTH, 500.0));
    let category_cards: Vec<_> = (0..6)
        .map(|i| place(Rect::new(80.0 + 200.0 * i as f64, 1400.0, 180.0, 240.0)))
        .collect();

    let steps = place(Rect::new(0.0, 2000.0, VIEWPORT_WIDTH, 400.0));
    let step_cards: Vec<_> = (0..4)
        .map(|i| place(Rect::new(80.0 + 300.0 * i as f64, 2080.0, 260.0, 240.0)))
        .collect();

    let benefits = place(Rect::new(0.0, 2700.0, VIEWPORT_WIDTH, 500.0));
    let benefit_rows: Vec<_> = (0..5)
        .map(|i| place(Rect::new(80.0, 2760.0 + 80.0 * i as f64, 600.0, 64.0)))
        .collect();

    LandingLayout::new()
        .header(header)
        .hero(hero)
        .stats(stats)
        .section("categories", categories, category_cards)
        .section("steps", steps, step_cards)
        .section("benefits", benefits, benefit_rows)
}

fn report(landing: &LandingMotion, frame: u32, scroll: f64, cta_scale: f64) {
    let counters: Vec<String> = landing.counters().iter().map(|c| c.display()).collect();
    let revealed = |name: &str| {
        landing
            .section(name)
            .map(|group| {
                (0..group.len())
                    .filter_map(|i| group.item_style(i))
                    .filter(|style| style.opacity >= 1.0)
                    .count()
            })
            .unwrap_or(0)
    };
    let logo = landing.logo_offset();

    println!(
        "frame {:>3} scroll {:>6.0} | stats [{}] | shown: categories {} steps {} benefits {} \
         | logo y {:>6.2} | cta x{:.3}",
        frame,
        scroll,
        counters.join(", "),
        revealed("categories"),
        revealed("steps"),
        revealed("benefits"),
        logo.y,
        cta_scale,
    );
}
