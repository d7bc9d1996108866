//-----------------------------------------------------------------------------
// Crate xcp_core
// Path: src/lib.rs

//! Native core of an XCP master: wire framing, DAQ decoding, and
//! compressed log recording/replay.
//!
//! The crate is organized around the path a measurement takes from wire to
//! application code:
//!
//! - [`framing`] reassembles length-prefixed frames out of a raw byte
//!   stream, for both the SXI (serial) and Ethernet transports.
//! - [`codec`] provides byte-order- and type-aware reads over a decoded
//!   frame's payload, plus PID and ODT-0 timestamp decoding.
//! - [`request`] builds outgoing master-to-slave command frames.
//! - [`daq`] holds the measurement data model (`McObject`, `DaqList`,
//!   `MeasurementParameters`) and the per-list/dispatching decoders that
//!   turn a stream of DAQ frames into completed measurement tuples.
//! - [`policy`] is the pluggable sink a transport hands received frames to:
//!   route to legacy per-category queues, decode online, or record to disk.
//! - [`log`] is the on-disk log file format, its writer and reader, and the
//!   replay decoder that reproduces online decoding from a recorded file.
//! - [`queue`] is the blocking FIFO used to hand frames across thread
//!   boundaries (legacy queues, log writer collector thread).

pub mod codec;
pub mod daq;
pub mod error;
pub mod framing;
pub mod log;
pub mod policy;
pub mod queue;
pub mod request;

pub use error::{Result, XcpCoreError};
