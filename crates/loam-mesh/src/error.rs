use loam_field::FieldError;
use thiserror::Error;

/// Faults of a single chunk's pipeline. None of these affect other chunks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    #[error("{buffer} buffer holds {actual} entries, extractor contract requires {expected}")]
    CapacityMismatch {
        buffer: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("field generation fault: {reason}")]
    GenerationFault { reason: String },
    #[error("extraction fault: {reason}")]
    ExtractionFault { reason: String },
    #[error("mesh handoff channel is full")]
    ChannelOverflow,
    #[error("mesh handoff channel has no consumer")]
    ChannelClosed,
}

impl ChunkError {
    pub fn fault(reason: impl Into<String>) -> Self {
        ChunkError::ExtractionFault {
            reason: reason.into(),
        }
    }
}
