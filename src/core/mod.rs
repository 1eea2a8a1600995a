pub mod arc;
pub mod curve;
pub mod escalation;
pub mod events;
pub mod generator;
pub mod graph;
pub mod plot;
pub mod session;
pub mod similarity;
pub mod volume;
