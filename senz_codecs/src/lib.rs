mod depth16z;
mod emb_table;
mod image8z;
mod jpeg;
mod uncompressed;
mod wire;

pub use depth16z::Depth16zCodec;
pub use emb_table::Depth16zTablesCodec;
pub use image8z::Image8zCodec;
pub use jpeg::JpegCodec;
pub use uncompressed::UncompressedCodec;

use senz_core::{Codec, CodecError, CodecId};

/// Construct the codec registered under `id`.
///
/// This is the in-process seam the host framework resolves recorded codec
/// tags through before binding the instance to a stream with
/// [`Codec::init`]. Unknown tags are a caller error, not a decode error.
pub fn codec_by_id(id: CodecId) -> Result<Box<dyn Codec>, CodecError> {
    match id {
        CodecId::UNCOMPRESSED => Ok(Box::new(UncompressedCodec)),
        CodecId::DEPTH_16Z => Ok(Box::new(Depth16zCodec)),
        CodecId::DEPTH_16Z_EMB_TABLES => Ok(Box::new(Depth16zTablesCodec::new())),
        CodecId::IMAGE_8Z => Ok(Box::new(Image8zCodec)),
        CodecId::JPEG => Ok(Box::new(JpegCodec::new())),
        other => Err(CodecError::BadParam(format!("unknown codec id {other}"))),
    }
}
