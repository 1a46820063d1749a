use thiserror::Error;

use crate::shared::PadId;

// Everything the control surface can reject. All variants are synchronous
// and raised before any state is touched; callers log and carry on, nothing
// here is allowed to take down the sequencer loop.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("no pad registered as {0}")]
    NotFound(PadId),
    #[error("{0} is already registered")]
    DuplicateId(PadId),
    #[error("recording in progress for {0}")]
    AlreadyRecording(PadId),
    #[error("no audio loaded for {0}")]
    NoAudioLoaded(PadId),
    #[error("out of range: {0}")]
    OutOfRange(String),
}
