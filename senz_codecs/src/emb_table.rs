//! 16-bit delta-RLE with an embedded symbol table ("16zT").
//!
//! Depth frames use only a sparse subset of the device's `0..max_value`
//! range, so remapping each raw value to a dense index shrinks the deltas
//! the 16z engine sees. The table lives inside the wire frame — nothing is
//! persisted between frames:
//!
//! ```text
//! [count: u16 LE]
//! [count × value: u16 LE]       sorted ascending, one per distinct sample
//! [16z stream over indices]     initial index literal in LE
//! ```
//!
//! Unlike the plain variant this one normalizes its multi-byte fields to
//! little-endian on the wire.

use std::sync::Arc;

use log::error;

use senz_core::{Codec, CodecError, CodecId, NodeKind, SourceNode};

use crate::depth16z::{decode_samples, encode_samples, samples_of, DEPTH16Z_WORST_RATIO};
use crate::wire::{ByteReader, ByteWriter, SampleSink};

/// 16-bit delta-RLE codec over per-frame dense indices.
///
/// Requires a depth-producing node at `init` time: the device's maximum
/// sample value bounds the occurrence scan and sizes the worst-case table
/// ([`overhead`](Codec::overhead) is `max_value * 2` — every possible value
/// occurring at once).
#[derive(Default)]
pub struct Depth16zTablesCodec {
    max_value: u16,
}

impl Depth16zTablesCodec {
    pub fn new() -> Self {
        Depth16zTablesCodec::default()
    }
}

impl Codec for Depth16zTablesCodec {
    fn id(&self) -> CodecId {
        CodecId::DEPTH_16Z_EMB_TABLES
    }

    fn name(&self) -> &'static str {
        "depth-16z-tables"
    }

    fn init(&mut self, node: &Arc<dyn SourceNode>) -> Result<(), CodecError> {
        if node.kind() != NodeKind::Depth {
            error!("codec 16z with embedded tables requires a depth node");
            return Err(CodecError::BadParam(
                "codec 16z with embedded tables requires a depth node".into(),
            ));
        }
        self.max_value = node.max_sample_value().ok_or_else(|| {
            CodecError::BadParam("depth node does not expose a maximum sample value".into())
        })?;
        Ok(())
    }

    fn worst_ratio(&self) -> f32 {
        DEPTH16Z_WORST_RATIO
    }

    fn overhead(&self) -> usize {
        self.max_value as usize * 2
    }

    fn encode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let max = self.max_value as usize;

        // Occurrence scan over the device range.
        let mut occurs = vec![false; max];
        for value in samples_of(src)? {
            let value = value as usize;
            if value >= max {
                return Err(CodecError::BadParam(format!(
                    "sample {value} is outside the device range 0..{max}"
                )));
            }
            occurs[value] = true;
        }

        // Dense indices in ascending value order.
        let mut index_of = vec![0u16; max];
        let mut distinct: Vec<u16> = Vec::new();
        for (value, occurs) in occurs.iter().enumerate() {
            if *occurs {
                index_of[value] = distinct.len() as u16;
                distinct.push(value as u16);
            }
        }

        let mut indices = samples_of(src)?.map(|v| index_of[v as usize]);
        let first = match indices.next() {
            Some(first) => first,
            None => return Ok(0),
        };

        let mut out = ByteWriter::new(dst);
        out.push_u16_le(distinct.len() as u16)?;
        for &value in &distinct {
            out.push_u16_le(value)?;
        }
        encode_samples(&mut out, first, first.to_le_bytes(), indices)?;
        Ok(out.position())
    }

    fn decode_frame(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        if src.len() < 2 {
            return Err(CodecError::BadParam("input size too small".into()));
        }
        let count = u16::from_le_bytes([src[0], src[1]]) as usize;
        let table_end = 2 + count * 2;
        if src.len() < table_end + 2 {
            return Err(CodecError::BadParam(
                "compressed frame shorter than its embedded table".into(),
            ));
        }
        let table: Vec<u16> = src[2..table_end]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        let first = u16::from_le_bytes([src[table_end], src[table_end + 1]]);

        let mut sink = SampleSink::new(dst);
        let mut emit = |index: u16| {
            let value = table.get(index as usize).copied().ok_or_else(|| {
                CodecError::BadParam(format!(
                    "decoded index {index} outside embedded table of {count} entries"
                ))
            })?;
            sink.put(value)
        };
        let mut input = ByteReader::new(&src[table_end + 2..]);
        decode_samples(&mut input, first, &mut emit)?;
        drop(emit);
        Ok(sink.bytes_written())
    }
}
