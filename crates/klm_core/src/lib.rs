//! KLM Motion Core
//!
//! The runtime capabilities every landing-page animation is built on:
//!
//! - **Frame Clock**: next-frame callbacks and absolute-deadline timers over a
//!   monotonic or manually advanced time source
//! - **Visibility Watching**: intersection ratios of subjects against the
//!   viewport, reported on threshold crossings
//! - **Geometry**: rectangles and offsets for viewport math and motion output
//!
//! Both capabilities are traits ([`Clock`], [`VisibilityWatcher`]) injected
//! into primitives instead of process-wide singletons, so a test can swap in
//! a manual clock and a scripted viewport.
//!
//! # Example
//!
//! ```rust
//! use klm_core::{
//!     AnimationClock, Clock, Rect, SubjectId, Threshold, ViewportWatcher, VisibilityWatcher,
//! };
//!
//! let clock = AnimationClock::manual();
//! let watcher = ViewportWatcher::new(1280.0, 720.0);
//!
//! let hero = SubjectId::new(1);
//! watcher.set_bounds(hero, Rect::new(0.0, 100.0, 600.0, 300.0));
//! watcher
//!     .observe(hero, Threshold::DEFAULT, Box::new(|entry| assert!(entry.ratio > 0.9)))
//!     .unwrap();
//!
//! watcher.refresh();
//! clock.tick(16.0);
//! ```

pub mod clock;
pub mod error;
pub mod geometry;
pub mod visibility;

pub use clock::{AnimationClock, Clock, FrameCallback, FrameRequest, Millis, SharedClock, FRAME_MS};
pub use error::{MotionError, Result};
pub use geometry::{Offset, Rect};
pub use visibility::{
    IntersectionEntry, ObserverId, SharedWatcher, SubjectId, Threshold, UnavailableWatcher,
    ViewportWatcher, VisibilityCallback, VisibilityWatcher,
};
