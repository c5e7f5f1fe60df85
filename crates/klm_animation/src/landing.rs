//! Landing page composition
//!
//! Wires every motion primitive of the landing page from a [`MotionConfig`]
//! and a [`LandingLayout`] describing which subjects exist:
//!
//! - Header slide-down and hero sequence on mount
//! - Statistic counters, each triggered by its own visibility
//! - Section groups revealed with a stagger when scrolled into view
//! - Floating dots, bobbing logo and orbit rings for the page's lifetime
//!
//! Anything absent from the layout is simply not mounted. Dropping
//! [`LandingMotion`] tears everything down.

use crate::ambient::{AmbientLoopMotion, DriftMotion, OrbitMotion, OrbitPositions, Periodic};
use crate::config::{MotionConfig, PressSettings, SectionMotion};
use crate::counter::{CounterAnimation, CounterConfig};
use crate::enter::EnterStyle;
use crate::press::{PressConfig, PressFeedback};
use crate::stagger::{RevealTrigger, StaggerConfig, StaggeredGroupReveal};
use klm_core::{Offset, Result, SharedClock, SharedWatcher, SubjectId, Threshold};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A section container and the items revealed inside it
#[derive(Clone, Debug, PartialEq)]
pub struct SectionLayout {
    pub group: SubjectId,
    pub items: Vec<SubjectId>,
}

/// Subjects present on the page
#[derive(Clone, Debug, Default)]
pub struct LandingLayout {
    pub header: Option<SubjectId>,
    pub hero_items: Vec<SubjectId>,
    /// One subject per configured statistic, in order
    pub stats: Vec<SubjectId>,
    pub sections: FxHashMap<String, SectionLayout>,
}

impl LandingLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, subject: SubjectId) -> Self {
        self.header = Some(subject);
        self
    }

    pub fn hero(mut self, items: impl IntoIterator<Item = SubjectId>) -> Self {
        self.hero_items = items.into_iter().collect();
        self
    }

    pub fn stats(mut self, subjects: impl IntoIterator<Item = SubjectId>) -> Self {
        self.stats = subjects.into_iter().collect();
        self
    }

    pub fn section(
        mut self,
        name: impl Into<String>,
        group: SubjectId,
        items: impl IntoIterator<Item = SubjectId>,
    ) -> Self {
        self.sections.insert(
            name.into(),
            SectionLayout {
                group,
                items: items.into_iter().collect(),
            },
        );
        self
    }
}

/// The mounted landing page motion
pub struct LandingMotion {
    clock: SharedClock,
    press: PressSettings,
    header: Option<StaggeredGroupReveal>,
    hero: Option<StaggeredGroupReveal>,
    counters: Vec<CounterAnimation>,
    sections: FxHashMap<String, StaggeredGroupReveal>,
    dots: Vec<(AmbientLoopMotion<DriftMotion>, Rc<Cell<Offset>>)>,
    logo: (AmbientLoopMotion<DriftMotion>, Rc<Cell<Offset>>),
    orbits: Vec<(AmbientLoopMotion<OrbitMotion>, Rc<RefCell<OrbitPositions>>)>,
}

impl LandingMotion {
    /// Mount every animation described by `config` over `layout`
    ///
    /// Fails only if `config` does not validate.
    pub fn mount(
        clock: SharedClock,
        watcher: SharedWatcher,
        config: &MotionConfig,
        layout: &LandingLayout,
    ) -> Result<Self> {
        config.validate()?;

        let header = layout.header.map(|subject| {
            StaggeredGroupReveal::reveal(
                clock.clone(),
                RevealTrigger::Mount,
                [subject],
                StaggerConfig::new(0.0),
                config.header.transition(),
            )
        });

        let hero = (!layout.hero_items.is_empty()).then(|| {
            StaggeredGroupReveal::reveal(
                clock.clone(),
                RevealTrigger::Mount,
                layout.hero_items.iter().copied(),
                config.hero.stagger(),
                config.hero.transition(),
            )
        });

        if layout.stats.len() != config.counter.stats.len() {
            tracing::warn!(
                "LandingMotion: {} stat subjects for {} configured stats",
                layout.stats.len(),
                config.counter.stats.len()
            );
        }
        let counter_threshold = Threshold::new(config.counter.threshold)?;
        let counters = layout
            .stats
            .iter()
            .zip(&config.counter.stats)
            .map(|(&subject, stat)| {
                CounterAnimation::mount(
                    clock.clone(),
                    watcher.clone(),
                    subject,
                    CounterConfig::new(stat.target)
                        .duration_ms(config.counter.duration_ms)
                        .threshold(counter_threshold)
                        .suffix(stat.suffix.clone()),
                )
            })
            .collect();

        let section_threshold = Threshold::new(config.sections.threshold)?;
        let mut sections = FxHashMap::default();
        for (name, section) in &layout.sections {
            let motion = match config.sections.get(name) {
                Some(motion) => motion.clone(),
                None => {
                    tracing::warn!(
                        "LandingMotion: no motion for section {:?}, using defaults",
                        name
                    );
                    SectionMotion::default()
                }
            };

            let group = StaggeredGroupReveal::reveal(
                clock.clone(),
                RevealTrigger::Viewport {
                    watcher: watcher.clone(),
                    subject: section.group,
                    threshold: section_threshold,
                },
                section.items.iter().copied(),
                motion.stagger(),
                motion.transition(config.sections.duration_ms),
            );
            sections.insert(name.clone(), group);
        }

        let dots = config
            .ambient
            .dots
            .iter()
            .map(|dot| drift(&clock, dot.motion()))
            .collect();
        let logo = drift(&clock, config.ambient.logo_motion());
        let orbits = config
            .ambient
            .orbits
            .iter()
            .map(|orbit| {
                let motion = orbit.motion();
                let positions = Rc::new(RefCell::new(motion.sample(0.0)));
                let sink = positions.clone();
                let ring = AmbientLoopMotion::start(clock.clone(), motion, move |slots| {
                    *sink.borrow_mut() = slots;
                });
                (ring, positions)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "LandingMotion: mounted {} counters, {} sections, {} orbit rings",
            layout.stats.len().min(config.counter.stats.len()),
            layout.sections.len(),
            orbits.len()
        );

        Ok(Self {
            clock,
            press: config.press.clone(),
            header,
            hero,
            counters,
            sections,
            dots,
            logo,
            orbits,
        })
    }

    /// Hover and tap feedback for one call-to-action button
    pub fn press(&self) -> PressFeedback {
        self.feedback(self.press.press_config())
    }

    /// Hover growth for a header navigation link
    pub fn press_nav(&self) -> PressFeedback {
        self.feedback(self.press.nav_config())
    }

    /// Hover lift for a category or step card
    pub fn press_card(&self) -> PressFeedback {
        self.feedback(self.press.card_config())
    }

    fn feedback(&self, config: PressConfig) -> PressFeedback {
        PressFeedback::new(self.clock.clone(), config)
    }

    pub fn header_style(&self) -> Option<EnterStyle> {
        self.header.as_ref().and_then(|header| header.item_style(0))
    }

    pub fn hero(&self) -> Option<&StaggeredGroupReveal> {
        self.hero.as_ref()
    }

    pub fn counters(&self) -> &[CounterAnimation] {
        &self.counters
    }

    pub fn counter(&self, index: usize) -> Option<&CounterAnimation> {
        self.counters.get(index)
    }

    pub fn section(&self, name: &str) -> Option<&StaggeredGroupReveal> {
        self.sections.get(name)
    }

    pub fn dot_offset(&self, index: usize) -> Option<Offset> {
        self.dots.get(index).map(|(_, offset)| offset.get())
    }

    pub fn logo_offset(&self) -> Offset {
        self.logo.1.get()
    }

    pub fn orbit_positions(&self, ring: usize) -> Option<OrbitPositions> {
        self.orbits.get(ring).map(|(_, positions)| positions.borrow().clone())
    }

    /// Check if every one-shot animation has run to completion
    pub fn is_fully_revealed(&self) -> bool {
        self.header.as_ref().map_or(true, |g| g.is_complete())
            && self.hero.as_ref().map_or(true, |g| g.is_complete())
            && self.counters.iter().all(|c| c.is_done())
            && self.sections.values().all(|g| g.is_complete())
    }
}

impl Drop for LandingMotion {
    fn drop(&mut self) {
        tracing::debug!(
            "LandingMotion: unmounting after {} ambient frames",
            self.logo.0.frames()
        );
    }
}

fn drift(
    clock: &SharedClock,
    motion: DriftMotion,
) -> (AmbientLoopMotion<DriftMotion>, Rc<Cell<Offset>>) {
    let offset = Rc::new(Cell::new(Offset::ZERO));
    let sink = offset.clone();
    let handle = AmbientLoopMotion::start(clock.clone(), motion, move |value| sink.set(value));
    (handle, offset)
}
