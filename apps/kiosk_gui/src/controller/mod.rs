//! Controller layer: bridge events, error modeling, and detector command orchestration.

pub mod events;
pub mod orchestration;
