//-----------------------------------------------------------------------------
// Module xcp_core::log::reader
// Path: src/log/reader.rs
//
// Mmap-based sequential decoder of the log file format. Grounded on
// original_source/pyxcp/recorder/reader.hpp's XcpLogFileReader.

use memmap2::Mmap;

use crate::error::{Result, XcpCoreError};
use crate::log::format::{self, Frame, CONTAINER_HEADER_LEN, HAS_METADATA, HDR_SIZE, MAGIC, VERSION};

struct FileHeader {
    options: u16,
    num_containers: u64,
    record_count: u64,
}

/// Sequential reader over an xcp-core log file, produced by `LogWriter`.
pub struct LogReader {
    mmap: Mmap,
    header: FileHeader,
    metadata: Option<Vec<u8>>,
    first_container_offset: u64,
    offset: u64,
    current_container: u64,
}

impl LogReader {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| XcpCoreError::io("open", e))?;
        let mmap = unsafe { Mmap::map(&file).map_err(|e| XcpCoreError::io("mmap", e))? };

        if mmap.len() < HDR_SIZE as usize || &mmap[0..16] != MAGIC {
            return Err(XcpCoreError::MagicMismatch);
        }

        let hdr_size = u16::from_le_bytes(mmap[16..18].try_into().unwrap());
        if hdr_size != HDR_SIZE {
            return Err(XcpCoreError::HeaderSizeMismatch { expected: HDR_SIZE, found: hdr_size });
        }
        let version = u16::from_le_bytes(mmap[18..20].try_into().unwrap());
        if version != VERSION {
            return Err(XcpCoreError::VersionMismatch { expected: VERSION, found: version });
        }
        let options = u16::from_le_bytes(mmap[20..22].try_into().unwrap());
        let num_containers = u64::from_le_bytes(mmap[22..30].try_into().unwrap());
        let record_count = u64::from_le_bytes(mmap[30..38].try_into().unwrap());

        let mut offset = HDR_SIZE as u64;
        let metadata = if options & HAS_METADATA != 0 {
            let start = offset as usize;
            let len = u64::from_le_bytes(mmap[start..start + 8].try_into().unwrap()) as usize;
            let data = mmap[start + 8..start + 8 + len].to_vec();
            offset += 8 + len as u64;
            Some(data)
        } else {
            None
        };

        let first_container_offset = offset;
        Ok(LogReader {
            mmap,
            header: FileHeader { options, num_containers, record_count },
            metadata,
            first_container_offset,
            offset,
            current_container: 0,
        })
    }

    pub fn metadata(&self) -> Option<&[u8]> {
        self.metadata.as_deref()
    }

    pub fn record_count(&self) -> u64 {
        self.header.record_count
    }

    pub fn options(&self) -> u16 {
        self.header.options
    }

    pub fn reset(&mut self) {
        self.current_container = 0;
        self.offset = self.first_container_offset;
    }

    /// Decodes and returns the next container's frames, or `None` after the
    /// last of `num_containers` has been consumed.
    pub fn next_block(&mut self) -> Result<Option<Vec<Frame>>> {
        if self.current_container >= self.header.num_containers {
            return Ok(None);
        }

        let base = self.offset as usize;
        if base + CONTAINER_HEADER_LEN > self.mmap.len() {
            return Err(XcpCoreError::DecompressionFailed);
        }
        let record_count = u32::from_le_bytes(self.mmap[base..base + 4].try_into().unwrap());
        let size_compressed = u32::from_le_bytes(self.mmap[base + 4..base + 8].try_into().unwrap());
        let size_uncompressed = u32::from_le_bytes(self.mmap[base + 8..base + 12].try_into().unwrap());

        let payload_start = base + CONTAINER_HEADER_LEN;
        let payload_end = payload_start + size_compressed as usize;
        if payload_end > self.mmap.len() {
            return Err(XcpCoreError::DecompressionFailed);
        }
        let compressed = &self.mmap[payload_start..payload_end];
        let decompressed = lz4::block::decompress(compressed, Some(size_uncompressed as i32))
            .map_err(|_| XcpCoreError::DecompressionFailed)?;

        let mut frames = Vec::with_capacity(record_count as usize);
        let mut cursor = 0usize;
        for _ in 0..record_count {
            let frame = format::read_frame(&decompressed, &mut cursor).ok_or(XcpCoreError::DecompressionFailed)?;
            frames.push(frame);
        }

        self.offset += (CONTAINER_HEADER_LEN + size_compressed as usize) as u64;
        self.current_container += 1;
        Ok(Some(frames))
    }
}
