//! Staggered group reveal
//!
//! Reveals an ordered group of items one after another once the group
//! itself is triggered. Every item's start is scheduled as an absolute
//! deadline from the group's fire time (`fired_at + delay_for_index(i)`),
//! never chained off the previous item, so slow frames can delay an item by
//! at most one frame and never push back the items after it.
//!
//! # Example
//!
//! ```rust
//! use klm_animation::stagger::{RevealTrigger, StaggerConfig, StaggeredGroupReveal};
//! use klm_animation::enter::EnterTransition;
//! use klm_core::{AnimationClock, SubjectId};
//! use std::rc::Rc;
//!
//! let clock = Rc::new(AnimationClock::manual());
//! let items: Vec<SubjectId> = (1..=3).map(SubjectId::new).collect();
//!
//! let group = StaggeredGroupReveal::reveal(
//!     clock.clone(),
//!     RevealTrigger::Mount,
//!     items,
//!     StaggerConfig::new(100.0),
//!     EnterTransition::fade_in_up(30.0),
//! );
//!
//! clock.run_for(1000.0, 16.0);
//! assert!(group.is_complete());
//! ```

use crate::enter::{EnterStyle, EnterTransition};
use crate::interpolate::{InterpolatorHandle, Tick, TimeInterpolator};
use crate::trigger::ViewportTrigger;
use klm_core::{FrameRequest, Millis, SharedClock, SharedWatcher, SubjectId, Threshold};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Direction for stagger ordering
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaggerDirection {
    /// Animate first to last
    #[default]
    Forward,
    /// Animate last to first
    Reverse,
    /// Animate from center outward
    FromCenter,
}

/// Configuration for stagger timing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaggerConfig {
    /// Delay between each item's start (ms)
    pub increment_ms: Millis,
    /// Delay before the first item (ms)
    pub base_delay_ms: Millis,
    /// Direction of stagger
    pub direction: StaggerDirection,
    /// Optional: cap the stagger step count at N
    pub limit: Option<usize>,
}

impl StaggerConfig {
    /// Create a new stagger config with delay between items
    pub fn new(increment_ms: Millis) -> Self {
        Self {
            increment_ms,
            base_delay_ms: 0.0,
            direction: StaggerDirection::Forward,
            limit: None,
        }
    }

    /// Wait before the first item starts
    pub fn base_delay(mut self, base_delay_ms: Millis) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Stagger from last to first
    pub fn reverse(mut self) -> Self {
        self.direction = StaggerDirection::Reverse;
        self
    }

    /// Stagger from center outward
    pub fn from_center(mut self) -> Self {
        self.direction = StaggerDirection::FromCenter;
        self
    }

    /// Limit stagger to first N steps
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Calculate the stagger delay for a specific item index
    pub fn delay_for_index(&self, index: usize, total: usize) -> Millis {
        let effective_index = match self.direction {
            StaggerDirection::Forward => index,
            StaggerDirection::Reverse => total.saturating_sub(1).saturating_sub(index),
            StaggerDirection::FromCenter => {
                let center = total / 2;
                center.abs_diff(index)
            }
        };

        let capped_index = match self.limit {
            Some(limit) => effective_index.min(limit),
            None => effective_index,
        };

        self.increment_ms.max(0.0) * capped_index as f64
    }

    /// Total delay (base plus stagger) for an item
    pub fn start_offset(&self, index: usize, total: usize) -> Millis {
        self.base_delay_ms.max(0.0) + self.delay_for_index(index, total)
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// What starts a group
pub enum RevealTrigger {
    /// When the group container first becomes visible
    Viewport {
        watcher: SharedWatcher,
        subject: SubjectId,
        threshold: Threshold,
    },
    /// Immediately on mount
    Mount,
}

impl RevealTrigger {
    pub fn viewport(watcher: SharedWatcher, subject: SubjectId) -> Self {
        RevealTrigger::Viewport {
            watcher,
            subject,
            threshold: Threshold::DEFAULT,
        }
    }
}

/// Field-less item state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    /// Waiting for the group, or for this item's delay
    Hidden,
    /// Transition running
    Entering,
    /// At rest, fully visible
    Shown,
}

enum ItemPhase {
    Hidden { timer: Option<FrameRequest> },
    Entering(InterpolatorHandle),
    Shown,
}

struct ItemSlot {
    subject: SubjectId,
    phase: ItemPhase,
    style: EnterStyle,
    started_at: Option<Millis>,
}

type ItemStartListener = Box<dyn FnMut(usize, Millis)>;

struct GroupInner {
    clock: SharedClock,
    config: StaggerConfig,
    transition: EnterTransition,
    items: RefCell<Vec<ItemSlot>>,
    fired_at: Cell<Option<Millis>>,
    disposed: Cell<bool>,
    trigger: RefCell<Option<ViewportTrigger>>,
    on_item_start: RefCell<Option<ItemStartListener>>,
}

impl GroupInner {
    fn fire(inner: &Rc<Self>) {
        if inner.disposed.get() || inner.fired_at.get().is_some() {
            return;
        }

        let fired_at = inner.clock.now();
        inner.fired_at.set(Some(fired_at));

        let mut items = inner.items.borrow_mut();
        let total = items.len();
        tracing::debug!(
            "StaggeredGroupReveal: group fired at {:.1}ms, scheduling {} items",
            fired_at,
            total
        );

        for (index, slot) in items.iter_mut().enumerate() {
            let deadline = fired_at + inner.config.start_offset(index, total);
            let weak = Rc::downgrade(inner);
            let timer = inner.clock.schedule_at(
                deadline,
                Box::new(move |now| {
                    if let Some(inner) = weak.upgrade() {
                        GroupInner::start_item(&inner, index, now);
                    }
                }),
            );
            slot.phase = ItemPhase::Hidden { timer: Some(timer) };
        }
    }

    fn start_item(inner: &Rc<Self>, index: usize, now: Millis) {
        {
            let mut items = inner.items.borrow_mut();
            let Some(slot) = items.get_mut(index) else {
                return;
            };
            if !matches!(slot.phase, ItemPhase::Hidden { .. }) {
                return;
            }
            slot.phase = ItemPhase::Hidden { timer: None };
            slot.started_at = Some(now);
        }

        let listener = inner.on_item_start.borrow_mut().take();
        if let Some(mut listener) = listener {
            listener(index, now);
            let mut slot = inner.on_item_start.borrow_mut();
            if slot.is_none() {
                *slot = Some(listener);
            }
        }

        // The listener may have unmounted the group
        if inner.disposed.get() {
            return;
        }

        let weak = Rc::downgrade(inner);
        let handle = TimeInterpolator::run(
            inner.clock.clone(),
            inner.transition.interpolation(),
            move |tick| {
                if let Some(inner) = weak.upgrade() {
                    GroupInner::apply_tick(&inner, index, tick);
                }
            },
        );

        tracing::trace!("StaggeredGroupReveal: item {} entering at {:.1}ms", index, now);
        if let Some(slot) = inner.items.borrow_mut().get_mut(index) {
            slot.phase = ItemPhase::Entering(handle);
        }
    }

    fn apply_tick(inner: &Rc<Self>, index: usize, tick: Tick) {
        let finished = {
            let mut items = inner.items.borrow_mut();
            let Some(slot) = items.get_mut(index) else {
                return;
            };
            slot.style = inner.transition.style_at(tick.value);
            if tick.is_final() {
                Some(std::mem::replace(&mut slot.phase, ItemPhase::Shown))
            } else {
                None
            }
        };

        // Drop the finished handle outside the borrow
        drop(finished);
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }

        self.trigger.borrow_mut().take();
        self.on_item_start.borrow_mut().take();

        let items = std::mem::take(&mut *self.items.borrow_mut());
        let mut cancelled = 0;
        for slot in items {
            match slot.phase {
                ItemPhase::Hidden { timer: Some(timer) } => {
                    self.clock.cancel(timer);
                    cancelled += 1;
                }
                ItemPhase::Entering(handle) => {
                    drop(handle);
                    cancelled += 1;
                }
                _ => {}
            }
        }

        if cancelled > 0 {
            tracing::debug!("StaggeredGroupReveal: unmounted with {} items in flight", cancelled);
        }
    }
}

/// An ordered group revealed with a per-item stagger
///
/// Dropping the group detaches its trigger and cancels every pending item
/// timer and running transition.
pub struct StaggeredGroupReveal {
    inner: Rc<GroupInner>,
}

impl StaggeredGroupReveal {
    /// Mount a group of `items` that reveals when `trigger` fires
    pub fn reveal(
        clock: SharedClock,
        trigger: RevealTrigger,
        items: impl IntoIterator<Item = SubjectId>,
        config: StaggerConfig,
        transition: EnterTransition,
    ) -> Self {
        let initial = transition.initial_style();
        let items = items
            .into_iter()
            .map(|subject| ItemSlot {
                subject,
                phase: ItemPhase::Hidden { timer: None },
                style: initial,
                started_at: None,
            })
            .collect();

        let inner = Rc::new(GroupInner {
            clock,
            config,
            transition,
            items: RefCell::new(items),
            fired_at: Cell::new(None),
            disposed: Cell::new(false),
            trigger: RefCell::new(None),
            on_item_start: RefCell::new(None),
        });

        match trigger {
            RevealTrigger::Mount => GroupInner::fire(&inner),
            RevealTrigger::Viewport {
                watcher,
                subject,
                threshold,
            } => {
                let weak = Rc::downgrade(&inner);
                let trigger = ViewportTrigger::mount(watcher, subject, threshold, move |_event| {
                    if let Some(inner) = weak.upgrade() {
                        GroupInner::fire(&inner);
                    }
                });
                *inner.trigger.borrow_mut() = Some(trigger);
            }
        }

        Self { inner }
    }

    /// Listen for items starting their transition: `(index, clock time)`
    pub fn on_item_start<F>(self, listener: F) -> Self
    where
        F: FnMut(usize, Millis) + 'static,
    {
        *self.inner.on_item_start.borrow_mut() = Some(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &StaggerConfig {
        &self.inner.config
    }

    pub fn has_fired(&self) -> bool {
        self.inner.fired_at.get().is_some()
    }

    /// Clock time at which the group fired
    pub fn fired_at(&self) -> Option<Millis> {
        self.inner.fired_at.get()
    }

    pub fn subject(&self, index: usize) -> Option<SubjectId> {
        self.inner.items.borrow().get(index).map(|slot| slot.subject)
    }

    pub fn item_state(&self, index: usize) -> Option<ItemState> {
        self.inner.items.borrow().get(index).map(|slot| match slot.phase {
            ItemPhase::Hidden { .. } => ItemState::Hidden,
            ItemPhase::Entering(_) => ItemState::Entering,
            ItemPhase::Shown => ItemState::Shown,
        })
    }

    pub fn item_style(&self, index: usize) -> Option<EnterStyle> {
        self.inner.items.borrow().get(index).map(|slot| slot.style)
    }

    /// Clock time at which an item's transition started
    pub fn item_started_at(&self, index: usize) -> Option<Millis> {
        self.inner.items.borrow().get(index).and_then(|slot| slot.started_at)
    }

    /// Check if every item is fully shown
    pub fn is_complete(&self) -> bool {
        self.has_fired()
            && self
                .inner
                .items
                .borrow()
                .iter()
                .all(|slot| matches!(slot.phase, ItemPhase::Shown))
    }
}

impl Drop for StaggeredGroupReveal {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}
