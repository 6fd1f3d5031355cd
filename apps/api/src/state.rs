use crate::config::Config;
use crate::generation::assembler::ResultGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the repositories, storage and font library behind `Arc`s.
    pub generator: ResultGenerator,
}
