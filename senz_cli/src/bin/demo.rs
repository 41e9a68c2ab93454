//! senz demo
//!
//! Synthesizes plausible sensor frames — a depth map with an object in
//! front of a sloped background, a grayscale plane, and an RGB test card —
//! then runs every applicable codec over them and prints a comparison
//! table with round-trip verification.

use std::sync::Arc;

use anyhow::Result;

use senz_codecs::{
    Depth16zCodec, Depth16zTablesCodec, Image8zCodec, JpegCodec, UncompressedCodec,
};
use senz_core::{Codec, ManualNode, PixelFormat, SourceNode, VideoMode};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const MAX_DEPTH: u16 = 10000;

// ── frame generators ───────────────────────────────────────────────────────

/// Depth map: background plane sloping away with the row, a round object
/// bump in the middle, and a dead zone (0 = no reading) along the left
/// edge, the way real depth sensors drop out near the emitter shadow.
fn depth_frame() -> Vec<u8> {
    let mut frame = Vec::with_capacity((WIDTH * HEIGHT * 2) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let value: u16 = if x < 8 {
                0
            } else {
                let background = 1500 + y as i32 * 4;
                let dx = x as i32 - 160;
                let dy = y as i32 - 120;
                let r2 = dx * dx + dy * dy;
                if r2 < 60 * 60 {
                    // object ~70cm closer, rounded toward its edges
                    (background - 700 + r2 / 12) as u16
                } else {
                    background as u16
                }
            };
            frame.extend_from_slice(&value.to_ne_bytes());
        }
    }
    frame
}

/// Grayscale plane: horizontal gradient with a brighter band, smooth enough
/// for the nibble path with a few larger steps at the band edges.
fn gray_frame() -> Vec<u8> {
    let mut frame = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let base = (x / 4) as u8;
            let value = if (96..128).contains(&y) { base.saturating_add(64) } else { base };
            frame.push(value);
        }
    }
    frame
}

/// RGB test card: vertical color bars over a luminance ramp.
fn rgb_frame() -> Vec<u8> {
    const BARS: &[[u8; 3]] =
        &[[235, 235, 235], [235, 235, 16], [16, 235, 235], [16, 235, 16], [235, 16, 235], [235, 16, 16], [16, 16, 235], [16, 16, 16]];
    let mut frame = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let bar = BARS[(x as usize * BARS.len()) / WIDTH as usize];
            let shade = (y * 255 / HEIGHT) as u16;
            for c in bar {
                frame.push(((c as u16 * (255 - shade / 4)) / 255) as u8);
            }
        }
    }
    frame
}

// ── runner ─────────────────────────────────────────────────────────────────

struct Row {
    codec: &'static str,
    raw: usize,
    compressed: usize,
    verdict: &'static str,
}

fn run_codec(
    mut codec: Box<dyn Codec>,
    node: &Arc<dyn SourceNode>,
    raw: &[u8],
    lossless: bool,
) -> Result<Row> {
    let name = codec.name();
    codec.init(node)?;

    let worst = (raw.len() as f32 * codec.worst_ratio()).ceil() as usize + codec.overhead();
    let mut compressed = vec![0u8; worst];
    let written = codec.compress(raw, &mut compressed)?;

    let mut restored = vec![0u8; raw.len()];
    let restored_len = codec.decompress(&compressed[..written], &mut restored)?;

    let verdict = if restored_len != raw.len() {
        "SIZE MISMATCH"
    } else if !lossless {
        "dimensions ok (lossy)"
    } else if restored[..restored_len] == *raw {
        "bit-exact"
    } else {
        "CONTENT MISMATCH"
    };

    Ok(Row { codec: name, raw: raw.len(), compressed: written, verdict })
}

fn print_table(title: &str, rows: &[Row]) {
    println!();
    println!("=== {title} ===");
    println!("  {:<18} {:>10} {:>12} {:>7}  {}", "codec", "raw", "compressed", "ratio", "round-trip");
    println!("  {}", "-".repeat(66));
    for row in rows {
        println!(
            "  {:<18} {:>10} {:>12} {:>6.2}x  {}",
            row.codec,
            row.raw,
            row.compressed,
            row.raw as f64 / row.compressed.max(1) as f64,
            row.verdict
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mode = VideoMode { width: WIDTH, height: HEIGHT, fps: 30 };

    // Depth stream: pass-through, plain 16z, and the embedded-table variant.
    let depth_node: Arc<dyn SourceNode> = ManualNode::depth("demo-depth", mode, MAX_DEPTH);
    let depth = depth_frame();
    let depth_rows = vec![
        run_codec(Box::new(UncompressedCodec), &depth_node, &depth, true)?,
        run_codec(Box::new(Depth16zCodec), &depth_node, &depth, true)?,
        run_codec(Box::new(Depth16zTablesCodec::new()), &depth_node, &depth, true)?,
    ];
    print_table("depth 320x240 gray16", &depth_rows);

    // Grayscale stream: 8z against pass-through, plus JPEG on the same plane.
    let gray_node: Arc<dyn SourceNode> =
        ManualNode::image("demo-gray", mode, PixelFormat::Grayscale8);
    let gray = gray_frame();
    let gray_rows = vec![
        run_codec(Box::new(UncompressedCodec), &gray_node, &gray, true)?,
        run_codec(Box::new(Image8zCodec), &gray_node, &gray, true)?,
        run_codec(Box::new(JpegCodec::new()), &gray_node, &gray, false)?,
    ];
    print_table("grayscale 320x240 gray8", &gray_rows);

    // RGB stream: JPEG.
    let rgb_node: Arc<dyn SourceNode> = ManualNode::image("demo-rgb", mode, PixelFormat::Rgb24);
    let rgb = rgb_frame();
    let rgb_rows = vec![
        run_codec(Box::new(UncompressedCodec), &rgb_node, &rgb, true)?,
        run_codec(Box::new(JpegCodec::new()), &rgb_node, &rgb, false)?,
    ];
    print_table("color 320x240 rgb24", &rgb_rows);

    Ok(())
}
