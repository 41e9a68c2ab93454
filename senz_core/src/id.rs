use std::fmt;

/// Four-byte codec identifier (fourCC style), e.g. `"16zP"`.
///
/// The tag is what a recording stores next to each compressed stream, so the
/// values below are wire constants: they must never be renumbered, only
/// extended. Packing into a `u32` is little-endian — the first character
/// lands in the low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodecId(pub [u8; 4]);

impl CodecId {
    /// "No codec chosen" marker used by hosts to request a default.
    pub const NULL: CodecId = CodecId([0; 4]);
    /// Pass-through: stored bytes are the raw frame.
    pub const UNCOMPRESSED: CodecId = CodecId(*b"NONE");
    /// 16-bit delta-RLE ("16z") over raw sample values.
    pub const DEPTH_16Z: CodecId = CodecId(*b"16zP");
    /// 16-bit delta-RLE over table indices, symbol table embedded per frame.
    pub const DEPTH_16Z_EMB_TABLES: CodecId = CodecId(*b"16zT");
    /// 8-bit delta-RLE ("8z") for single-byte image planes.
    pub const IMAGE_8Z: CodecId = CodecId(*b"Im8z");
    /// Single-frame JPEG via the external encoder/decoder.
    pub const JPEG: CodecId = CodecId(*b"JPEG");

    pub const fn from_u32(raw: u32) -> Self {
        CodecId(raw.to_le_bytes())
    }

    pub const fn as_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic()) {
            for b in self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08x}", self.as_u32())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_packing_is_little_endian() {
        let id = CodecId::JPEG;
        assert_eq!(id.as_u32(), u32::from_le_bytes(*b"JPEG"));
        assert_eq!(CodecId::from_u32(id.as_u32()), id);
    }

    #[test]
    fn display_prints_tag_or_hex() {
        assert_eq!(CodecId::DEPTH_16Z.to_string(), "16zP");
        assert_eq!(CodecId::NULL.to_string(), "0x00000000");
    }
}
