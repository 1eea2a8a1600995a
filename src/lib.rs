//! Novel Planner — structural planning and consistency checks for long-form fiction.
//!
//! Turns a chapter count into a volume plan and a conflict curve, gives each
//! chapter its narrative phase and guidance, and checks generated chapters
//! against character arcs, the planned curve, the causal event graph and
//! earlier outlines. Text generation itself is supplied by the caller.

pub mod config;
pub mod core;
pub mod schema;

pub use crate::config::PlannerConfig;
pub use crate::core::session::{ChapterDraft, ChapterReview, NovelSession, SessionError};
