//! JPEG adapter over the external single-shot encoder/decoder.
//!
//! The external library works strictly on caller-supplied memory regions —
//! no file I/O, no streaming. This adapter negotiates geometry and pixel
//! format with the image node it is bound to and keeps that negotiation
//! current by watching the node's output-mode and cropping notifications.
//!
//! The whole negotiated configuration lives in one immutable [`FrameShape`]
//! snapshot behind a lock: the change handler builds the new shape
//! completely and publishes it in a single store, so a transform running on
//! another thread sees either the old or the new geometry, never a torn mix.

use std::sync::{Arc, Mutex, RwLock, Weak};

use log::{debug, error};

use senz_core::{Codec, CodecError, CodecId, NodeKind, PixelFormat, SourceNode, WatcherId};

pub(crate) const JPEG_WORST_RATIO: f32 = 1.2;
const JPEG_DEFAULT_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorMode {
    Rgb,
    Gray,
}

impl ColorMode {
    fn components(self) -> usize {
        match self {
            ColorMode::Rgb => 3,
            ColorMode::Gray => 1,
        }
    }

    fn encoder_color(self) -> jpeg_encoder::ColorType {
        match self {
            ColorMode::Rgb => jpeg_encoder::ColorType::Rgb,
            ColorMode::Gray => jpeg_encoder::ColorType::Luma,
        }
    }
}

/// One negotiated configuration, replaced wholesale on reconfiguration.
#[derive(Debug, Clone, Copy)]
struct FrameShape {
    width: u32,
    height: u32,
    color: ColorMode,
    quality: u8,
}

impl FrameShape {
    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * self.color.components()
    }
}

#[derive(Debug, Clone, Copy)]
enum JpegState {
    Unconfigured,
    Reconfiguring,
    Valid(FrameShape),
    Invalid,
}

/// State shared between the codec and the node-notification callback.
struct JpegShared {
    state: RwLock<JpegState>,
    /// Reusable encode buffer; discarded and rebuilt after any encoder
    /// failure so the next call starts from clean state.
    scratch: Mutex<Vec<u8>>,
}

impl JpegShared {
    fn require_valid(&self) -> Result<FrameShape, CodecError> {
        match *self.state.read().expect("jpeg state lock poisoned") {
            JpegState::Valid(shape) => Ok(shape),
            JpegState::Unconfigured => {
                Err(CodecError::Failure("jpeg codec is not bound to an image stream".into()))
            }
            JpegState::Reconfiguring => {
                Err(CodecError::Failure("jpeg codec is reconfiguring".into()))
            }
            JpegState::Invalid => {
                Err(CodecError::Failure("jpeg codec is in an invalid configuration".into()))
            }
        }
    }

    /// Re-read geometry and format off the node and publish the result.
    fn reconfigure(&self, node: &dyn SourceNode) -> Result<(), CodecError> {
        *self.state.write().expect("jpeg state lock poisoned") = JpegState::Reconfiguring;
        match shape_from_node(node) {
            Ok(shape) => {
                debug!(
                    "jpeg codec: node '{}' now {}x{} {:?}",
                    node.name(),
                    shape.width,
                    shape.height,
                    shape.color
                );
                *self.state.write().expect("jpeg state lock poisoned") = JpegState::Valid(shape);
                Ok(())
            }
            Err(err) => {
                error!("jpeg codec: reconfiguration for node '{}' failed: {err}", node.name());
                *self.state.write().expect("jpeg state lock poisoned") = JpegState::Invalid;
                Err(err)
            }
        }
    }
}

fn shape_from_node(node: &dyn SourceNode) -> Result<FrameShape, CodecError> {
    let mode = node.video_mode();
    let (mut width, mut height) = (mode.width, mode.height);

    if let Some(cropping) = node.cropping() {
        if cropping.enabled {
            width = cropping.x_size;
            height = cropping.y_size;
        }
    }

    let color = match node.pixel_format() {
        PixelFormat::Rgb24 => ColorMode::Rgb,
        PixelFormat::Grayscale8 => ColorMode::Gray,
        other => {
            return Err(CodecError::Failure(format!(
                "jpeg supports only Rgb24 and Grayscale8 pixel formats, not {other:?}"
            )))
        }
    };

    if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(CodecError::Failure(format!("jpeg cannot encode {width}x{height} frames")));
    }

    Ok(FrameShape { width, height, color, quality: JPEG_DEFAULT_QUALITY })
}

/// Lossy JPEG codec for image streams (3-component color at the default
/// quality, or single-component grayscale).
///
/// `Compress`/`Decompress` fail with [`CodecError::Failure`] while the
/// adapter is not in the `Valid` state — before `init`, during a
/// reconfiguration, or after the node switched to an unsupported format.
pub struct JpegCodec {
    shared: Arc<JpegShared>,
    node: Option<Weak<dyn SourceNode>>,
    watch: Option<WatcherId>,
}

impl JpegCodec {
    pub fn new() -> Self {
        JpegCodec {
            shared: Arc::new(JpegShared {
                state: RwLock::new(JpegState::Unconfigured),
                scratch: Mutex::new(Vec::new()),
            }),
            node: None,
            watch: None,
        }
    }

    fn unwatch(&mut self) {
        if let (Some(node), Some(id)) =
            (self.node.as_ref().and_then(Weak::upgrade), self.watch.take())
        {
            node.unwatch_config(id);
        }
        self.node = None;
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        JpegCodec::new()
    }
}

impl Drop for JpegCodec {
    fn drop(&mut self) {
        self.unwatch();
    }
}

impl Codec for JpegCodec {
    fn id(&self) -> CodecId {
        CodecId::JPEG
    }

    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn init(&mut self, node: &Arc<dyn SourceNode>) -> Result<(), CodecError> {
        if node.kind() != NodeKind::Image {
            error!("codec JPEG requires an image node");
            return Err(CodecError::BadParam("codec JPEG requires an image node".into()));
        }

        // Rebinding replaces any previous subscription.
        self.unwatch();

        let shared = Arc::downgrade(&self.shared);
        let weak_node = Arc::downgrade(node);
        let id = node.watch_config(Arc::new(move || {
            if let (Some(shared), Some(node)) = (shared.upgrade(), weak_node.upgrade()) {
                // A failed reconfiguration leaves the codec Invalid; the
                // error itself surfaces on the next compress/decompress.
                let _ = shared.reconfigure(node.as_ref());
            }
        }));
        self.watch = Some(id);
        self.node = Some(Arc::downgrade(node));

        self.shared.reconfigure(node.as_ref())
    }

    fn worst_ratio(&self) -> f32 {
        JPEG_WORST_RATIO
    }

    fn overhead(&self) -> usize {
        0
    }

    fn encode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let shape = self.shared.require_valid()?;

        let expected = shape.frame_len();
        if src.len() != expected {
            return Err(CodecError::BadParam(format!(
                "frame is {} bytes but the negotiated {}x{} {:?} layout needs {expected}",
                src.len(),
                shape.width,
                shape.height,
                shape.color
            )));
        }

        let mut scratch = self.shared.scratch.lock().expect("jpeg scratch lock poisoned");
        scratch.clear();

        let encoder = jpeg_encoder::Encoder::new(&mut *scratch, shape.quality);
        if let Err(err) = encoder.encode(src, shape.width as u16, shape.height as u16, shape.color.encoder_color())
        {
            // Discard whatever the failed run left behind; the next call
            // must start from a clean context.
            *scratch = Vec::new();
            error!("jpeg encoder failed: {err}");
            return Err(CodecError::Failure(format!("jpeg encoder: {err}")));
        }

        if scratch.len() > dst.len() {
            return Err(CodecError::OutputBufferOverflow {
                needed: scratch.len(),
                capacity: dst.len(),
            });
        }
        dst[..scratch.len()].copy_from_slice(&scratch);
        Ok(scratch.len())
    }

    fn decode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        self.shared.require_valid()?;

        if src.is_empty() {
            return Err(CodecError::BadParam("input size is 0".into()));
        }

        let mut decoder = jpeg_decoder::Decoder::new(src);
        decoder
            .read_info()
            .map_err(|err| CodecError::Failure(format!("jpeg decoder: {err}")))?;
        let info = decoder
            .info()
            .ok_or_else(|| CodecError::Failure("jpeg decoder produced no header info".into()))?;

        let components = match info.pixel_format {
            jpeg_decoder::PixelFormat::RGB24 => 3,
            jpeg_decoder::PixelFormat::L8 => 1,
            other => {
                return Err(CodecError::Failure(format!(
                    "jpeg frame has unsupported pixel format {other:?}"
                )))
            }
        };

        let out_len = info.width as usize * info.height as usize * components;
        if out_len > dst.len() {
            return Err(CodecError::OutputBufferOverflow { needed: out_len, capacity: dst.len() });
        }

        let pixels = decoder
            .decode()
            .map_err(|err| CodecError::Failure(format!("jpeg decoder: {err}")))?;
        if pixels.len() > dst.len() {
            return Err(CodecError::OutputBufferOverflow {
                needed: pixels.len(),
                capacity: dst.len(),
            });
        }
        dst[..pixels.len()].copy_from_slice(&pixels);
        Ok(pixels.len())
    }
}
