//-----------------------------------------------------------------------------
// Module xcp_core::framing
// Path: src/framing/mod.rs
//
// Transport framers: reassemble length-prefixed frames out of a byte stream
// coming from a serial line (SXI) or a TCP socket (Ethernet).

pub mod ethernet;
pub mod sxi;

pub use ethernet::EthernetReceiver;
pub use sxi::{ChecksumType, HeaderFormat, SxiReceiver};
