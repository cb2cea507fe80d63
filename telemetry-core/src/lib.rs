// Core simulation for the Pitwall telemetry server: track geometry,
// vehicle physics, rival synthesis, and sample history.

pub mod buffer;
pub mod clock;
pub mod model;
pub mod physics;
pub mod rivals;
pub mod track;
