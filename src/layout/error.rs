use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// An explicit source names no frame placed before the referencing one.
    #[error("frame `{frame}` references source frame `{source_frame}` which is not placed before it")]
    UnresolvedSource { frame: String, source_frame: String },

    #[error("no box was placed for frame `{frame}` at position {index}")]
    MissingTargetBox { frame: String, index: usize },

    #[error("text measurement unavailable: {0}")]
    MeasurementUnavailable(String),
}
