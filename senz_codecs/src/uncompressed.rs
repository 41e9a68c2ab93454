use senz_core::{Codec, CodecError, CodecId};

/// No-op codec: the wire frame is the raw frame.
///
/// Serves as the baseline/fallback when a stream should be recorded without
/// compression, and as the reference implementation for exercising the
/// façade's buffer-size policy in isolation (ratio 1.0, overhead 0 make the
/// pre-flight formula exact).
pub struct UncompressedCodec;

impl Codec for UncompressedCodec {
    fn id(&self) -> CodecId {
        CodecId::UNCOMPRESSED
    }

    fn name(&self) -> &'static str {
        "uncompressed"
    }

    fn worst_ratio(&self) -> f32 {
        1.0
    }

    fn overhead(&self) -> usize {
        0
    }

    fn encode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        copy_checked(src, dst)
    }

    fn decode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        copy_checked(src, dst)
    }
}

fn copy_checked(src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
    if src.len() > dst.len() {
        return Err(CodecError::OutputBufferOverflow { needed: src.len(), capacity: dst.len() });
    }
    dst[..src.len()].copy_from_slice(src);
    Ok(src.len())
}
