//! Contract tests for the codec façade: the worst-case buffer-size policy,
//! the identifier registry, and the source-node notification plumbing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use senz_codecs::{codec_by_id, Depth16zCodec, Depth16zTablesCodec, UncompressedCodec};
use senz_core::{
    Codec, CodecError, CodecId, ManualNode, PixelFormat, SourceNode, VideoMode,
};

fn bytes_of(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// The destination size the worst-case formula promises is always enough.
fn worst_case(codec: &dyn Codec, src_len: usize) -> usize {
    (src_len as f32 * codec.worst_ratio()).ceil() as usize + codec.overhead()
}

// ── buffer-size policy ─────────────────────────────────────────────────────

#[test]
fn compress_rejects_undersized_destination_before_any_work() {
    let codec = UncompressedCodec;
    let raw = vec![7u8; 1024];

    let mut dst = vec![0u8; raw.len() - 1];
    let err = codec.compress(&raw, &mut dst).unwrap_err();
    match err {
        CodecError::OutputBufferOverflow { needed, capacity } => {
            assert_eq!(needed, raw.len());
            assert_eq!(capacity, raw.len() - 1);
        }
        other => panic!("expected OutputBufferOverflow, got {other:?}"),
    }
}

#[test]
fn compress_at_exactly_the_worst_case_size_never_fails() {
    let raw16 = bytes_of(&(0..512u16).map(|i| 1000 + (i % 13)).collect::<Vec<u16>>());

    let mut table_codec = Depth16zTablesCodec::new();
    let node: Arc<dyn SourceNode> =
        ManualNode::depth("contract", VideoMode { width: 32, height: 16, fps: 30 }, 2048);
    table_codec.init(&node).unwrap();

    let codecs: Vec<Box<dyn Codec>> =
        vec![Box::new(UncompressedCodec), Box::new(Depth16zCodec), Box::new(table_codec)];

    for codec in &codecs {
        let exact = worst_case(codec.as_ref(), raw16.len());

        let mut dst = vec![0u8; exact];
        codec
            .compress(&raw16, &mut dst)
            .unwrap_or_else(|e| panic!("{} failed at its own worst case: {e}", codec.name()));

        let mut under = vec![0u8; exact - 1];
        let err = codec.compress(&raw16, &mut under).unwrap_err();
        assert!(
            err.is_overflow(),
            "{} accepted a destination below its worst case",
            codec.name()
        );
    }
}

#[test]
fn decompress_has_no_preflight_check() {
    // A destination exactly as large as the decoded frame is fine even
    // though it is far below src_len * worst_ratio.
    let codec = Depth16zCodec;
    let raw = bytes_of(&[42; 1000]);

    let mut compressed = vec![0u8; worst_case(&codec, raw.len())];
    let written = codec.compress(&raw, &mut compressed).unwrap();
    assert!(written < 80, "constant frame should collapse into run bytes");

    let mut dst = vec![0u8; raw.len()];
    let decoded = codec.decompress(&compressed[..written], &mut dst).unwrap();
    assert_eq!(decoded, raw.len());
    assert_eq!(dst, raw);
}

// ── registry ───────────────────────────────────────────────────────────────

#[test]
fn registry_resolves_every_registered_id() {
    for id in [
        CodecId::UNCOMPRESSED,
        CodecId::DEPTH_16Z,
        CodecId::DEPTH_16Z_EMB_TABLES,
        CodecId::IMAGE_8Z,
        CodecId::JPEG,
    ] {
        let codec = codec_by_id(id).unwrap_or_else(|e| panic!("id {id} did not resolve: {e}"));
        assert_eq!(codec.id(), id);
    }
}

#[test]
fn registry_rejects_unknown_ids() {
    let err = codec_by_id(CodecId(*b"ZZZZ")).unwrap_err();
    assert!(matches!(err, CodecError::BadParam(_)));

    let err = codec_by_id(CodecId::NULL).unwrap_err();
    assert!(matches!(err, CodecError::BadParam(_)));
}

// ── source-node notifications ──────────────────────────────────────────────

#[test]
fn manual_node_fires_watchers_on_every_config_change() {
    let node = ManualNode::image(
        "watched",
        VideoMode { width: 640, height: 480, fps: 30 },
        PixelFormat::Rgb24,
    );

    let fired = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&fired);
    let id = node.watch_config(Arc::new(move || {
        observed.fetch_add(1, Ordering::SeqCst);
    }));

    node.set_video_mode(VideoMode { width: 320, height: 240, fps: 60 });
    node.set_pixel_format(PixelFormat::Grayscale8);
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    node.unwatch_config(id);
    node.set_pixel_format(PixelFormat::Rgb24);
    assert_eq!(fired.load(Ordering::SeqCst), 2, "unsubscribed watcher must not fire");
}

#[test]
fn watcher_sees_the_published_configuration() {
    let node = ManualNode::image(
        "published",
        VideoMode { width: 640, height: 480, fps: 30 },
        PixelFormat::Rgb24,
    );

    let seen = Arc::new(AtomicUsize::new(0));
    let inner_node = Arc::clone(&node);
    let inner_seen = Arc::clone(&seen);
    node.watch_config(Arc::new(move || {
        // The new value is published before watchers run.
        inner_seen.store(inner_node.video_mode().width as usize, Ordering::SeqCst);
    }));

    node.set_video_mode(VideoMode { width: 111, height: 222, fps: 30 });
    assert_eq!(seen.load(Ordering::SeqCst), 111);
}

#[test]
fn depth_node_exposes_its_device_range() {
    let node = ManualNode::depth("depth", VideoMode { width: 640, height: 480, fps: 30 }, 10000);
    assert_eq!(node.max_sample_value(), Some(10000));

    let image =
        ManualNode::image("img", VideoMode { width: 640, height: 480, fps: 30 }, PixelFormat::Rgb24);
    assert_eq!(image.max_sample_value(), None);
}
