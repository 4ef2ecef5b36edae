//! Infrastructure layer - process-level concerns around the engine

pub mod logging;
