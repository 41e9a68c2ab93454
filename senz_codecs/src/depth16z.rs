//! 16-bit delta-RLE ("16z") — the depth-stream wire format.
//!
//! Sensor frames are strongly spatially correlated, so successive samples
//! usually differ by a handful of units. The format spends a nibble per
//! sample in that common case and degrades to wider encodings for larger
//! jumps:
//!
//! - `|last - curr| <= 6`: nibble `delta + 6` (0..=12), two per byte, high
//!   slot first.
//! - `7 <= |delta| <= 63`: escape (`0xFF`, or low-nibble `0xF` when a high
//!   nibble is pending) then one byte `delta + 192` — top bit always set.
//! - larger jumps: escape then the absolute sample value, high byte first.
//!   The top bit of such a literal must be clear to keep it distinguishable
//!   from the medium-delta byte, so representable samples stop at `0x7FFF`.
//! - a completed `0x66` byte (two unchanged samples) is counted instead of
//!   emitted; runs flush as `0xE0 + n` control bytes (n = 1..=15), each of
//!   which stands for `n` *pairs* of repeats.
//! - a half-filled byte at end of stream is padded with low-nibble `0xD`.
//!
//! The stream begins with sample 0 as a two-byte literal in host order.
//! The control-byte values are a fixed wire protocol shared with existing
//! recordings; they are not tunable.

use senz_core::{Codec, CodecError, CodecId};

use crate::wire::{ByteReader, ByteWriter, SampleSink};

/// Worst-case expansion declared by both 16-bit variants (wire constant).
pub(crate) const DEPTH16Z_WORST_RATIO: f32 = 1.333;

const SMALL_MAX: i32 = 6;
const MEDIUM_MAX: i32 = 63;
const MEDIUM_BIAS: i32 = 192;
const ZERO_PAIR: u8 = 0x66;
const RUN_BASE: u8 = 0xE0;
const RUN_MAX: u8 = 15;
const ESCAPE: u8 = 0xFF;
const ESCAPE_LOW: u8 = 0x0F;
const PAD_LOW: u8 = 0x0D;

// ── engine ─────────────────────────────────────────────────────────────────

fn flush_run(out: &mut ByteWriter, zero_run: &mut u8) -> Result<(), CodecError> {
    if *zero_run != 0 {
        out.push(RUN_BASE + *zero_run)?;
        *zero_run = 0;
    }
    Ok(())
}

/// Encode a 16-bit sample stream after its initial literal.
///
/// `first` seeds the running value; `first_literal` is its on-wire form
/// (host order for the plain codec, little-endian for the embedded-table
/// variant, which runs this engine over table indices instead of samples).
pub(crate) fn encode_samples(
    out: &mut ByteWriter,
    first: u16,
    first_literal: [u8; 2],
    rest: impl Iterator<Item = u16>,
) -> Result<(), CodecError> {
    out.push_pair(first_literal)?;

    let mut last = first;
    let mut pending_high: Option<u8> = None;
    let mut zero_run: u8 = 0;

    for curr in rest {
        let diff = last as i32 - curr as i32;
        if diff.abs() <= SMALL_MAX {
            let nib = (diff + SMALL_MAX) as u8;
            match pending_high.take() {
                None => pending_high = Some(nib << 4),
                Some(hi) => {
                    let byte = hi | nib;
                    if byte == ZERO_PAIR {
                        zero_run += 1;
                        if zero_run == RUN_MAX {
                            out.push(RUN_BASE + RUN_MAX)?;
                            zero_run = 0;
                        }
                    } else {
                        flush_run(out, &mut zero_run)?;
                        out.push(byte)?;
                    }
                }
            }
        } else {
            flush_run(out, &mut zero_run)?;
            match pending_high.take() {
                None => out.push(ESCAPE)?,
                Some(hi) => out.push(hi | ESCAPE_LOW)?,
            }
            if diff.abs() <= MEDIUM_MAX {
                out.push((diff + MEDIUM_BIAS) as u8)?;
            } else {
                if curr > 0x7FFF {
                    return Err(CodecError::BadParam(format!(
                        "sample {curr} exceeds the 15-bit literal range of the 16z wire format"
                    )));
                }
                out.push((curr >> 8) as u8)?;
                out.push((curr & 0xFF) as u8)?;
            }
        }
        last = curr;
    }

    // Flush order matters: the run precedes the half-byte pad so a trailing
    // run of unchanged samples is replayed before the final delta.
    flush_run(out, &mut zero_run)?;
    if let Some(hi) = pending_high {
        out.push(hi | PAD_LOW)?;
    }
    Ok(())
}

fn apply_small(last: u16, nib: u8) -> u16 {
    // last -= nib - 6, wrapping like the 16-bit arithmetic it mirrors
    last.wrapping_add(SMALL_MAX as u16).wrapping_sub(nib as u16)
}

fn read_extended(input: &mut ByteReader, last: u16) -> Result<u16, CodecError> {
    let byte = input.next()?;
    if byte & 0x80 != 0 {
        // medium delta, biased by 192
        Ok(last.wrapping_add(MEDIUM_BIAS as u16).wrapping_sub(byte as u16))
    } else {
        // absolute literal, high byte first
        let low = input.next()?;
        Ok(((byte as u16) << 8) | low as u16)
    }
}

/// Decode a 16-bit sample stream, emitting the initial value and every
/// reconstructed sample through `emit` (which owns destination bounds and,
/// for the embedded-table variant, the index → value mapping).
pub(crate) fn decode_samples<F>(
    input: &mut ByteReader,
    first: u16,
    emit: &mut F,
) -> Result<(), CodecError>
where
    F: FnMut(u16) -> Result<(), CodecError>,
{
    emit(first)?;
    let mut last = first;

    while !input.done() {
        let byte = input.next()?;
        if byte < RUN_BASE {
            let hi = byte >> 4;
            let lo = byte & 0x0F;

            last = apply_small(last, hi);
            emit(last)?;

            if lo == ESCAPE_LOW {
                last = read_extended(input, last)?;
                emit(last)?;
            } else if lo != PAD_LOW {
                last = apply_small(last, lo);
                emit(last)?;
            }
        } else if byte == ESCAPE {
            last = read_extended(input, last)?;
            emit(last)?;
        } else {
            // 0xE1..=0xEF: n pairs of the running value
            for _ in 0..(byte - RUN_BASE) {
                emit(last)?;
                emit(last)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn samples_of(src: &[u8]) -> Result<impl Iterator<Item = u16> + '_, CodecError> {
    if src.len() % 2 != 0 {
        return Err(CodecError::BadParam(format!(
            "16-bit frame length {} is not a whole number of samples",
            src.len()
        )));
    }
    Ok(src.chunks_exact(2).map(|c| u16::from_ne_bytes([c[0], c[1]])))
}

// ── codec ──────────────────────────────────────────────────────────────────

/// Plain 16-bit delta-RLE codec over raw sample values.
///
/// Binds to any node; the wire frame is only decodable against the same
/// stream geometry it was produced from.
pub struct Depth16zCodec;

impl Codec for Depth16zCodec {
    fn id(&self) -> CodecId {
        CodecId::DEPTH_16Z
    }

    fn name(&self) -> &'static str {
        "depth-16z"
    }

    fn worst_ratio(&self) -> f32 {
        DEPTH16Z_WORST_RATIO
    }

    fn overhead(&self) -> usize {
        0
    }

    fn encode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let mut samples = samples_of(src)?;
        let first = match samples.next() {
            Some(first) => first,
            None => return Ok(0),
        };
        let mut out = ByteWriter::new(dst);
        // Initial literal stays in host order — a long-standing quirk of this
        // variant (the embedded-table one normalizes; this one never did).
        encode_samples(&mut out, first, first.to_ne_bytes(), samples)?;
        Ok(out.position())
    }

    fn decode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        if src.len() < 2 {
            return Err(CodecError::BadParam("input size too small".into()));
        }
        let first = u16::from_ne_bytes([src[0], src[1]]);
        let mut sink = SampleSink::new(dst);
        let mut emit = |value: u16| sink.put(value);
        let mut input = ByteReader::new(&src[2..]);
        decode_samples(&mut input, first, &mut emit)?;
        drop(emit);
        Ok(sink.bytes_written())
    }
}
