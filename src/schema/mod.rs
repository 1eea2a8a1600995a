//! Plain, serializable records shared by the planning engines.

pub mod arc;
pub mod chapter;
pub mod event;
pub mod volume;
