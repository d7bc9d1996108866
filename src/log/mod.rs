//-----------------------------------------------------------------------------
// Module xcp_core::log
// Path: src/log/mod.rs
//
// On-disk log file format, writer, reader, and replay decoder.

pub mod format;
pub mod reader;
pub mod replay;
pub mod writer;

pub use format::{Frame, FrameCategory};
pub use reader::LogReader;
pub use replay::LogReplayDecoder;
pub use writer::LogWriter;
