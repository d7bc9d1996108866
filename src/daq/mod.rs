//-----------------------------------------------------------------------------
// Module xcp_core::daq
// Path: src/daq/mod.rs
//
// DAQ data model, per-list decoder, and dispatching processor.

pub mod daqlist;
pub mod decoder;
pub mod mcobject;
pub mod params;
pub mod processor;

pub use daqlist::{predefined_daq_list, DaqList, FlatEntry};
pub use decoder::{DaqListState, FeedOutcome};
pub use mcobject::{Bin, McObject};
pub use params::{MeasurementParameters, TimestampInfo};
pub use processor::{DaqProcessor, ListCompletion};
