use std::sync::Arc;

use log::error;

use crate::error::CodecError;
use crate::id::CodecId;
use crate::node::SourceNode;

/// Core frame-codec abstraction.
///
/// Each `Codec` implementation:
/// - Is identified by a stable fourCC [`id`](Codec::id) recorded next to the
///   stream it compressed.
/// - Is bound to at most one source stream at a time via
///   [`init`](Codec::init); codecs that require a particular producer kind
///   (depth for the embedded-table variant, image for JPEG) reject anything
///   else with [`CodecError::BadParam`].
/// - Transforms one frame per call, synchronously, into a caller-supplied
///   destination buffer. A wire frame is only meaningful to the same codec
///   type bound to the same stream geometry.
/// - Declares its worst-case expansion through
///   [`worst_ratio`](Codec::worst_ratio) and [`overhead`](Codec::overhead),
///   which the provided [`compress`](Codec::compress) uses to reject
///   undersized destinations before doing any work.
///
/// A codec instance must be confined to one thread at a time: never call
/// `compress`/`decompress` on the same instance concurrently, including
/// concurrently with a configuration-change notification it subscribed to
/// (implementations synchronize internally against their own callbacks, not
/// against multiple callers).
pub trait Codec: Send + Sync {
    /// Stable fourCC identifying this codec variant.
    fn id(&self) -> CodecId;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    /// Bind the codec to a source stream and read initial configuration off
    /// the node. The default accepts any node and reads nothing.
    fn init(&mut self, node: &Arc<dyn SourceNode>) -> Result<(), CodecError> {
        let _ = node;
        Ok(())
    }

    /// Worst-case output/input size ratio. A wire-protocol constant: hosts
    /// size destination buffers from it, so it must never shrink.
    fn worst_ratio(&self) -> f32;

    /// Fixed worst-case output bytes on top of `src_len * worst_ratio()`.
    /// Zero for every variant except the embedded-table one.
    fn overhead(&self) -> usize;

    /// The variant's raw encode routine. Implementations may assume the
    /// destination passed the worst-case pre-check but must still never
    /// write past it.
    fn encode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError>;

    /// The variant's raw decode routine. No pre-flight check exists on this
    /// path: implementations track their own write cursor and fail with
    /// [`CodecError::OutputBufferOverflow`] before any out-of-bounds write.
    fn decode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError>;

    /// Compress one frame, returning the number of bytes written.
    ///
    /// Fails with [`CodecError::OutputBufferOverflow`] before any work when
    /// `dst` is smaller than the declared worst case for `src.len()`. The
    /// bytes actually written are usually far fewer.
    fn compress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let worst = src.len() as f32 * self.worst_ratio() + self.overhead() as f32;
        if worst > dst.len() as f32 {
            error!(
                "{}: cannot compress, destination buffer too small ({} < worst case {})",
                self.name(),
                dst.len(),
                worst.ceil()
            );
            return Err(CodecError::OutputBufferOverflow {
                needed: worst.ceil() as usize,
                capacity: dst.len(),
            });
        }
        self.encode_frame(src, dst)
    }

    /// Decompress one frame, returning the number of bytes written.
    ///
    /// Delegates straight to the decode routine; destination bounds are
    /// enforced by the decoder's write cursor, not by a pre-check.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        self.decode_frame(src, dst)
    }
}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}
