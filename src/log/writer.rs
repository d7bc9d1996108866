//-----------------------------------------------------------------------------
// Module xcp_core::log::writer
// Path: src/log/writer.rs
//
// Chunked, LZ4-HC-compressed, memory-mapped append-only log writer.
// Grounded on original_source/pyxcp/recorder/writer.hpp's XcpLogFileWriter.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::info;
use memmap2::MmapMut;

use crate::error::{Result, XcpCoreError};
use crate::log::format::{self, CONTAINER_HEADER_LEN, HAS_METADATA, HDR_SIZE, MAGIC, VERSION};
use crate::queue::BlockingQueue;

const LZ4_HC_LEVEL: i32 = 12;

enum WriterMsg {
    Frame { category: u8, counter: u16, timestamp: u64, payload: Vec<u8> },
    Shutdown,
}

struct CollectorState {
    file: std::fs::File,
    mmap: MmapMut,
    chunk_bytes: usize,
    hard_limit: u64,
    offset: u64,
    metadata_present: bool,
    intermediate: Vec<u8>,
    num_containers: u64,
    record_count: u64,
    total_size_compressed: u64,
    total_size_uncompressed: u64,
    container_record_count: u32,
}

impl CollectorState {
    fn store_frame(&mut self, category: u8, counter: u16, timestamp: u64, payload: &[u8]) {
        format::write_frame(&mut self.intermediate, category, counter, timestamp, payload);
        self.container_record_count += 1;
    }

    fn compress_frames(&mut self) -> Result<()> {
        if self.container_record_count == 0 {
            return Ok(());
        }
        let uncompressed_len = self.intermediate.len();
        let compressed = lz4::block::compress(
            &self.intermediate,
            Some(lz4::block::CompressionMode::HIGHCOMPRESSION(LZ4_HC_LEVEL)),
            false,
        )
        .map_err(|_| XcpCoreError::CompressionFailed)?;

        let needed = self.offset as usize + CONTAINER_HEADER_LEN + compressed.len();
        if needed as u64 > self.hard_limit / 2 {
            self.grow(needed as u64)?;
        }

        let container_off = self.offset as usize;
        self.mmap[container_off..container_off + 4].copy_from_slice(&self.container_record_count.to_le_bytes());
        self.mmap[container_off + 4..container_off + 8].copy_from_slice(&(compressed.len() as u32).to_le_bytes());
        self.mmap[container_off + 8..container_off + 12].copy_from_slice(&(uncompressed_len as u32).to_le_bytes());
        let payload_off = container_off + CONTAINER_HEADER_LEN;
        self.mmap[payload_off..payload_off + compressed.len()].copy_from_slice(&compressed);

        self.offset += (CONTAINER_HEADER_LEN + compressed.len()) as u64;
        self.total_size_uncompressed += uncompressed_len as u64;
        self.total_size_compressed += compressed.len() as u64;
        self.record_count += self.container_record_count as u64;
        self.num_containers += 1;
        self.container_record_count = 0;
        self.intermediate.clear();
        Ok(())
    }

    fn grow(&mut self, at_least: u64) -> Result<()> {
        let mut new_limit = self.hard_limit.max(1);
        while new_limit < at_least {
            new_limit <<= 1;
        }
        info!("doubling measurement file size to {} bytes", new_limit);
        self.hard_limit = new_limit;
        self.file.set_len(self.hard_limit).map_err(|e| XcpCoreError::io("ftruncate", e))?;
        self.mmap.flush().map_err(|e| XcpCoreError::io("msync", e))?;
        // SAFETY: re-map the same file after growing it; the prior mapping
        // is dropped before the new one is created.
        self.mmap = unsafe { MmapMut::map_mut(&self.file).map_err(|e| XcpCoreError::io("mmap", e))? };
        self.write_header()?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        self.mmap[0..16].copy_from_slice(MAGIC);
        let options: u16 = if self.metadata_present { HAS_METADATA } else { 0 };
        let mut header = Vec::with_capacity(38);
        header.extend_from_slice(&HDR_SIZE.to_le_bytes());
        header.extend_from_slice(&VERSION.to_le_bytes());
        header.extend_from_slice(&options.to_le_bytes());
        header.extend_from_slice(&self.num_containers.to_le_bytes());
        header.extend_from_slice(&self.record_count.to_le_bytes());
        header.extend_from_slice(&self.total_size_compressed.to_le_bytes());
        header.extend_from_slice(&self.total_size_uncompressed.to_le_bytes());
        self.mmap[16..16 + 38].copy_from_slice(&header);
        Ok(())
    }

    fn finalize(mut self) -> Result<()> {
        self.compress_frames()?;
        self.write_header()?;
        self.mmap.flush().map_err(|e| XcpCoreError::io("msync", e))?;
        drop(self.mmap);
        self.file.set_len(self.offset).map_err(|e| XcpCoreError::io("ftruncate", e))?;
        Ok(())
    }
}

fn megabytes(n: u32) -> u64 {
    n as u64 * 1024 * 1024
}

/// Chunked, LZ4-HC-compressed, memory-mapped append-only log writer. Owns a
/// single dedicated collector thread; `add_frame` is safe to call
/// concurrently from any number of producer threads and never blocks on I/O
/// or compression.
pub struct LogWriter {
    queue: Arc<BlockingQueue<WriterMsg>>,
    thread: Option<JoinHandle<Result<()>>>,
    finalized: AtomicBool,
}

impl LogWriter {
    /// `chunk_bytes` is honored as given by the caller (diverging from the
    /// original, which silently ignores its own `chunk_size` constructor
    /// parameter and hardcodes 512 KiB).
    pub fn open(path: impl AsRef<std::path::Path>, prealloc_mb: u32, chunk_bytes: usize, metadata: Option<&[u8]>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())
            .map_err(|e| XcpCoreError::io("open", e))?;

        let hard_limit = megabytes(prealloc_mb).max(HDR_SIZE as u64 + 8);
        file.set_len(hard_limit).map_err(|e| XcpCoreError::io("ftruncate", e))?;

        let mut mmap = unsafe { MmapMut::map_mut(&file).map_err(|e| XcpCoreError::io("mmap", e))? };

        let mut offset = HDR_SIZE as u64;
        let metadata_present = metadata.is_some();
        if let Some(metadata) = metadata {
            let len_field = metadata.len() as u64;
            let start = offset as usize;
            mmap[start..start + 8].copy_from_slice(&len_field.to_le_bytes());
            mmap[start + 8..start + 8 + metadata.len()].copy_from_slice(metadata);
            offset += 8 + metadata.len() as u64;
        }

        let mut state = CollectorState {
            file,
            mmap,
            chunk_bytes,
            hard_limit,
            offset,
            metadata_present,
            intermediate: Vec::with_capacity(chunk_bytes + chunk_bytes / 4),
            num_containers: 0,
            record_count: 0,
            total_size_compressed: 0,
            total_size_uncompressed: 0,
            container_record_count: 0,
        };
        state.write_header()?;

        let queue: Arc<BlockingQueue<WriterMsg>> = Arc::new(BlockingQueue::new());
        let collector_queue = Arc::clone(&queue);
        let thread = std::thread::spawn(move || -> Result<()> {
            loop {
                match collector_queue.get() {
                    WriterMsg::Frame { category, counter, timestamp, payload } => {
                        state.store_frame(category, counter, timestamp, &payload);
                        let pending = state.intermediate.len();
                        if pending > state.chunk_bytes {
                            state.compress_frames()?;
                        }
                    }
                    WriterMsg::Shutdown => {
                        return state.finalize();
                    }
                }
            }
        });

        Ok(LogWriter { queue, thread: Some(thread), finalized: AtomicBool::new(false) })
    }

    /// Enqueues a frame for the collector thread. Never blocks on I/O or
    /// compression; becomes a no-op once `finalize()` has started.
    pub fn add_frame(&self, category: u8, counter: u16, timestamp: u64, payload: &[u8]) {
        if self.finalized.load(Ordering::Acquire) {
            return;
        }
        self.queue.put(WriterMsg::Frame { category, counter, timestamp, payload: payload.to_vec() });
    }

    /// Stops the collector, compresses any residual frames, rewrites the
    /// file header with final totals, and truncates the file to its exact
    /// used length. Idempotent and safe from any thread.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.queue.put(WriterMsg::Shutdown);
        match self.thread.take() {
            Some(handle) => handle.join().unwrap_or(Ok(())),
            None => Ok(()),
        }
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::reader::LogReader;

    #[test]
    fn s6_log_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s6.xmraw");

        let categories = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut expected = Vec::new();
        {
            let mut writer = LogWriter::open(&path, 1, 8192, None).unwrap();
            for i in 0..1000u32 {
                let size = 1 + (i as usize * 37) % 512;
                let payload: Vec<u8> = (0..size).map(|b| (b % 256) as u8).collect();
                let category = categories[i as usize % categories.len()];
                writer.add_frame(category, i as u16, i as u64 * 1000, &payload);
                expected.push((category, i as u16, i as u64 * 1000, payload));
            }
            writer.finalize().unwrap();
        }

        let mut reader = LogReader::open(&path).unwrap();
        let mut got = Vec::new();
        while let Some(block) = reader.next_block().unwrap() {
            for frame in block {
                got.push((frame.category, frame.counter, frame.timestamp, frame.payload));
            }
        }

        assert_eq!(got.len(), expected.len());
        assert_eq!(got, expected);
        assert_eq!(reader.record_count(), 1000);
    }

    #[test]
    fn finalize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idempotent.xmraw");
        let mut writer = LogWriter::open(&path, 1, 1024, None).unwrap();
        writer.add_frame(6, 0, 0, &[1, 2, 3]);
        writer.finalize().unwrap();
        writer.finalize().unwrap();
    }
}
