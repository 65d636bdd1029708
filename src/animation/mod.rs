//! Window slide animation
//!
//! Easing curves plus the animator that moves windows step by step.

mod animator;
mod easing;

pub use animator::{AnimationEvent, Animator, SlideKind, SlideRequest};
