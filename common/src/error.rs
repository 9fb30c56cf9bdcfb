#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Rejected at startup; the simulation never runs with these settings.
    #[error("invalid engine settings: {0}")]
    InvalidSettings(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("unknown remote action: {0}")]
    UnknownRemoteAction(String),
}
