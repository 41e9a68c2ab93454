use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use xxhash_rust::xxh3::xxh3_64;

use senz_codecs::{
    Depth16zCodec, Depth16zTablesCodec, Image8zCodec, JpegCodec, UncompressedCodec,
};
use senz_core::{Codec, CodecId, ManualNode, PixelFormat, SourceNode, VideoMode};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "senz",
    about = "Compress, decompress, verify, and benchmark single sensor frames",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Stream geometry the codec is bound to. Wire frames are not
/// self-describing (JPEG aside), so decompression needs the same values
/// the frame was compressed with.
#[derive(Args)]
struct StreamArgs {
    /// Frame width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Frame height in pixels
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Pixel format: gray16 | gray8 | rgb24
    #[arg(long, default_value = "gray16")]
    format: String,

    /// Device maximum sample value (depth streams only)
    #[arg(long, default_value_t = 10000)]
    max_depth: u16,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a raw frame file
    Compress {
        /// Raw frame to compress
        input: PathBuf,
        /// Destination for the compressed frame
        output: PathBuf,
        /// Codec: none | 16z | 16zt | 8z | jpeg
        #[arg(short, long, default_value = "16z")]
        codec: String,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Decompress a frame back to raw bytes
    Decompress {
        /// Compressed frame
        input: PathBuf,
        /// Destination for the raw frame
        output: PathBuf,
        /// Codec: none | 16z | 16zt | 8z | jpeg
        #[arg(short, long, default_value = "16z")]
        codec: String,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Round-trip a raw frame in memory and check the result
    Verify {
        /// Raw frame to verify
        input: PathBuf,
        /// Codec: none | 16z | 16zt | 8z | jpeg
        #[arg(short, long, default_value = "16z")]
        codec: String,
        #[command(flatten)]
        stream: StreamArgs,
    },
    /// Benchmark repeated compression of one frame
    Bench {
        /// Raw frame to compress repeatedly
        input: PathBuf,
        /// Codec: none | 16z | 16zt | 8z | jpeg
        #[arg(short, long, default_value = "16z")]
        codec: String,
        /// Number of compress iterations
        #[arg(short = 'n', long, default_value_t = 1000)]
        count: u64,
        #[command(flatten)]
        stream: StreamArgs,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn codec_from_name(name: &str) -> anyhow::Result<Box<dyn Codec>> {
    match name {
        "none" | "uncompressed" => Ok(Box::new(UncompressedCodec)),
        "16z" => Ok(Box::new(Depth16zCodec)),
        "16zt" | "tables" => Ok(Box::new(Depth16zTablesCodec::new())),
        "8z" => Ok(Box::new(Image8zCodec)),
        "jpeg" => Ok(Box::new(JpegCodec::new())),
        other => anyhow::bail!("unknown codec '{}'. Valid options: none, 16z, 16zt, 8z, jpeg", other),
    }
}

fn node_from_stream(stream: &StreamArgs) -> anyhow::Result<Arc<dyn SourceNode>> {
    let mode = VideoMode { width: stream.width, height: stream.height, fps: 30 };
    let node: Arc<dyn SourceNode> = match stream.format.as_str() {
        "gray16" => ManualNode::depth("cli-stream", mode, stream.max_depth),
        "gray8" => ManualNode::image("cli-stream", mode, PixelFormat::Grayscale8),
        "rgb24" => ManualNode::image("cli-stream", mode, PixelFormat::Rgb24),
        other => anyhow::bail!("unknown format '{}'. Valid options: gray16, gray8, rgb24", other),
    };
    Ok(node)
}

fn raw_frame_len(stream: &StreamArgs) -> anyhow::Result<usize> {
    let bpp = match stream.format.as_str() {
        "gray16" => 2,
        "gray8" => 1,
        "rgb24" => 3,
        other => anyhow::bail!("unknown format '{}'. Valid options: gray16, gray8, rgb24", other),
    };
    Ok(stream.width as usize * stream.height as usize * bpp)
}

/// Build the codec, bind it to the described stream, and report its tag.
fn bound_codec(name: &str, stream: &StreamArgs) -> anyhow::Result<Box<dyn Codec>> {
    let mut codec = codec_from_name(name)?;
    let node = node_from_stream(stream)?;
    codec
        .init(&node)
        .with_context(|| format!("binding codec '{}' to the described stream", name))?;
    Ok(codec)
}

fn worst_case_len(codec: &dyn Codec, src_len: usize) -> usize {
    (src_len as f32 * codec.worst_ratio()).ceil() as usize + codec.overhead()
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    stream: &StreamArgs,
) -> anyhow::Result<()> {
    let raw = fs::read(&input).with_context(|| format!("reading input frame {:?}", input))?;
    let codec = bound_codec(codec_name, stream)?;

    let mut dst = vec![0u8; worst_case_len(codec.as_ref(), raw.len())];
    let t0 = Instant::now();
    let written = codec.compress(&raw, &mut dst)?;
    let elapsed = t0.elapsed();

    fs::write(&output, &dst[..written])
        .with_context(|| format!("writing compressed frame {:?}", output))?;

    eprintln!("  codec       : {} ({})", codec.name(), codec.id());
    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  compressed  : {}", human_bytes(written as u64));
    eprintln!("  ratio       : {:.2}x", raw.len() as f64 / written.max(1) as f64);
    eprintln!(
        "  throughput  : {}/s",
        human_bytes((raw.len() as f64 / elapsed.as_secs_f64()) as u64)
    );
    eprintln!("  elapsed     : {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

fn run_decompress(
    input: PathBuf,
    output: PathBuf,
    codec_name: &str,
    stream: &StreamArgs,
) -> anyhow::Result<()> {
    let compressed =
        fs::read(&input).with_context(|| format!("reading compressed frame {:?}", input))?;
    let codec = bound_codec(codec_name, stream)?;

    let mut dst = vec![0u8; raw_frame_len(stream)?];
    let t0 = Instant::now();
    let written = codec.decompress(&compressed, &mut dst)?;
    let elapsed = t0.elapsed();

    fs::write(&output, &dst[..written])
        .with_context(|| format!("writing raw frame {:?}", output))?;

    eprintln!("  codec       : {} ({})", codec.name(), codec.id());
    eprintln!("  compressed  : {}", human_bytes(compressed.len() as u64));
    eprintln!("  raw size    : {}", human_bytes(written as u64));
    eprintln!("  elapsed     : {:.3}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

fn run_verify(input: PathBuf, codec_name: &str, stream: &StreamArgs) -> anyhow::Result<()> {
    let raw = fs::read(&input).with_context(|| format!("reading input frame {:?}", input))?;
    let codec = bound_codec(codec_name, stream)?;

    let mut compressed = vec![0u8; worst_case_len(codec.as_ref(), raw.len())];
    let written = codec.compress(&raw, &mut compressed)?;

    let mut restored = vec![0u8; raw.len()];
    let restored_len = codec.decompress(&compressed[..written], &mut restored)?;

    if codec.id() == CodecId::JPEG {
        // Lossy: only the dimensions survive, so check the byte count.
        if restored_len != raw.len() {
            anyhow::bail!(
                "jpeg round-trip produced {} bytes, expected {} (dimensions not preserved)",
                restored_len,
                raw.len()
            );
        }
        eprintln!("  jpeg round-trip preserved dimensions ({} bytes); content is lossy", restored_len);
        return Ok(());
    }

    let raw_hash = xxh3_64(&raw);
    let restored_hash = xxh3_64(&restored[..restored_len]);
    if restored_len != raw.len() || raw_hash != restored_hash {
        anyhow::bail!(
            "round-trip mismatch: {} bytes in, {} bytes out, xxh3 {:016x} vs {:016x}",
            raw.len(),
            restored_len,
            raw_hash,
            restored_hash
        );
    }

    eprintln!("  round-trip OK: {} bytes, xxh3 {:016x}", raw.len(), raw_hash);
    eprintln!(
        "  compressed {} -> {} ({:.2}x)",
        human_bytes(raw.len() as u64),
        human_bytes(written as u64),
        raw.len() as f64 / written.max(1) as f64
    );
    Ok(())
}

fn run_bench(input: PathBuf, codec_name: &str, count: u64, stream: &StreamArgs) -> anyhow::Result<()> {
    if count == 0 {
        anyhow::bail!("iteration count must be at least 1");
    }

    let raw = fs::read(&input).with_context(|| format!("reading input frame {:?}", input))?;
    let codec = bound_codec(codec_name, stream)?;

    let mut dst = vec![0u8; worst_case_len(codec.as_ref(), raw.len())];

    eprintln!("benchmarking {} compress calls with codec {}...", count, codec.name());

    let t0 = Instant::now();
    let mut latencies_us: Vec<u64> = Vec::with_capacity(count as usize);
    let mut written = 0usize;

    for _ in 0..count {
        let t = Instant::now();
        written = codec.compress(&raw, &mut dst)?;
        latencies_us.push(t.elapsed().as_micros() as u64);
    }

    let elapsed = t0.elapsed();
    latencies_us.sort_unstable();

    let p50 = latencies_us[latencies_us.len() / 2];
    let p95 = latencies_us[(latencies_us.len() as f64 * 0.95) as usize];
    let p99 = latencies_us[(latencies_us.len() as f64 * 0.99) as usize];

    println!();
    println!("=== Frame Compression Benchmark ===");
    println!("  codec       : {} ({})", codec.name(), codec.id());
    println!("  frame       : {}", human_bytes(raw.len() as u64));
    println!("  compressed  : {}", human_bytes(written as u64));
    println!("  iterations  : {}", count);
    println!(
        "  throughput  : {}/s",
        human_bytes(((raw.len() as u64 * count) as f64 / elapsed.as_secs_f64()) as u64)
    );
    println!("  latency:");
    println!("    min  : {} µs", latencies_us[0]);
    println!("    p50  : {} µs", p50);
    println!("    p95  : {} µs", p95);
    println!("    p99  : {} µs", p99);
    println!("    max  : {} µs", latencies_us[latencies_us.len() - 1]);

    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress { input, output, codec, stream } => {
            run_compress(input, output, &codec, &stream)
        }
        Commands::Decompress { input, output, codec, stream } => {
            run_decompress(input, output, &codec, &stream)
        }
        Commands::Verify { input, codec, stream } => run_verify(input, &codec, &stream),
        Commands::Bench { input, codec, count, stream } => run_bench(input, &codec, count, &stream),
    }
}
