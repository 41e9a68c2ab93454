use thiserror::Error;

/// Error taxonomy shared by every codec.
///
/// Propagation policy: each routine returns on the first detected fault and
/// no partial output is considered valid. A failed `compress`/`decompress`
/// means *that frame is lost*; the stream and the codec object stay usable.
/// The exception is `BadParam` out of `init`, which is a host configuration
/// error (wrong node kind bound to the codec) and must be fixed before the
/// codec can be used at all.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Wrong source-node kind at bind time, or malformed / out-of-domain
    /// input handed to a transform.
    #[error("bad parameter: {0}")]
    BadParam(String),

    /// Destination buffer cannot hold the result. On compress this is
    /// detected up front from the worst-case ratio; on decompress it is
    /// raised by the write cursor the moment a write would go out of bounds.
    #[error("output buffer overflow: {needed} bytes needed, {capacity} available")]
    OutputBufferOverflow { needed: usize, capacity: usize },

    /// The codec is not currently in a usable state (e.g. the JPEG adapter
    /// mid-reconfiguration or after an unsupported-format change), or the
    /// underlying compression library reported a failure.
    #[error("codec failure: {0}")]
    Failure(String),
}

impl CodecError {
    pub fn is_overflow(&self) -> bool {
        matches!(self, CodecError::OutputBufferOverflow { .. })
    }
}
