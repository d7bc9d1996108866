//-----------------------------------------------------------------------------
// Module xcp_core::log::format
// Path: src/log/format.rs
//
// On-disk log file layout constants and record structs. Grounded on
// original_source/pyxcp/recorder/writer.hpp and reader.hpp.

/// 16-byte file magic, written verbatim at offset 0.
pub const MAGIC: &[u8; 16] = b"ASAMINT::XCP_RAW";

/// `hdr_size` field value: the file header's own size (38) plus the magic
/// (16).
pub const HDR_SIZE: u16 = 38 + 16;

pub const VERSION: u16 = 0x0100;

/// Options bitmask: bit 2 set means a metadata block follows the header.
pub const HAS_METADATA: u16 = 0x0004;

/// Frame category, identifying which logical channel a recorded frame came
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameCategory {
    Meta = 0,
    Cmd = 1,
    Res = 2,
    Err = 3,
    Ev = 4,
    Serv = 5,
    Daq = 6,
    Stim = 7,
}

impl FrameCategory {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => FrameCategory::Meta,
            1 => FrameCategory::Cmd,
            2 => FrameCategory::Res,
            3 => FrameCategory::Err,
            4 => FrameCategory::Ev,
            5 => FrameCategory::Serv,
            6 => FrameCategory::Daq,
            7 => FrameCategory::Stim,
            _ => return None,
        })
    }
}

/// One recorded frame, as it appears inside a decompressed container.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub category: u8,
    pub counter: u16,
    pub timestamp: u64,
    pub payload: Vec<u8>,
}

/// Fixed size of a frame's header fields, not counting its payload:
/// `category(1) + counter(2) + timestamp(8) + length(2)`.
pub const FRAME_HEADER_LEN: usize = 1 + 2 + 8 + 2;

/// Fixed size of a container's header: `record_count(4) + size_compressed(4)
/// + size_uncompressed(4)`.
pub const CONTAINER_HEADER_LEN: usize = 4 + 4 + 4;

pub(crate) fn write_frame(out: &mut Vec<u8>, category: u8, counter: u16, timestamp: u64, payload: &[u8]) {
    out.push(category);
    out.extend_from_slice(&counter.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(payload);
}

pub(crate) fn read_frame(buf: &[u8], offset: &mut usize) -> Option<Frame> {
    if *offset + FRAME_HEADER_LEN > buf.len() {
        return None;
    }
    let category = buf[*offset];
    let counter = u16::from_le_bytes(buf[*offset + 1..*offset + 3].try_into().unwrap());
    let timestamp = u64::from_le_bytes(buf[*offset + 3..*offset + 11].try_into().unwrap());
    let length = u16::from_le_bytes(buf[*offset + 11..*offset + 13].try_into().unwrap()) as usize;
    *offset += FRAME_HEADER_LEN;
    if *offset + length > buf.len() {
        return None;
    }
    let payload = buf[*offset..*offset + length].to_vec();
    *offset += length;
    Some(Frame { category, counter, timestamp, payload })
}
