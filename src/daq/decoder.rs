//-----------------------------------------------------------------------------
// Module xcp_core::daq::decoder
// Path: src/daq/decoder.rs
//
// Per-list ODT-sequencing state machine. Grounded on
// original_source/pyxcp/recorder/unfolder.hpp's DaqListState.

use log::warn;

use crate::codec::{self, Value};
use crate::daq::daqlist::DaqList;
use crate::daq::params::MeasurementParameters;
use crate::error::{Result, XcpCoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Collecting,
}

/// Outcome of feeding one ODT to a list's state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    /// More ODTs are expected before the list completes.
    Collecting,
    /// The list's final ODT arrived; `(timestamp0, timestamp1, values)` is
    /// the completed tuple, values in entry order across all of the list's
    /// ODTs.
    Finished(u64, u64, Vec<Value>),
    /// A duplicate, reordered, or missing ODT number was observed; the
    /// state machine has been reset to `Idle`.
    Error,
    /// An ODT arrived that doesn't match any expected transition from
    /// `Idle` (anything but a synch pulse at ODT 0); dropped, no state
    /// change.
    Ignore,
}

/// One DAQ list's decoding state. Owns enough of the list's static layout
/// (`flatten_odts`, byte-order-aware swap flag, session timing parameters)
/// to unfold ODT payloads without consulting the processor.
pub struct DaqListState {
    name: String,
    num_odts: u16,
    flatten_odts: Vec<Vec<crate::daq::daqlist::FlatEntry>>,
    enable_timestamps: bool,
    initial_offset: u16,
    swap: bool,
    timestamps_supported: bool,
    ts_fixed: bool,
    selectable_timestamps: bool,
    ts_scale_factor: f64,
    ts_size: u8,
    state: State,
    next_odt: u16,
    timestamp0: u64,
    timestamp1: u64,
    buffer: Vec<Value>,
}

impl DaqListState {
    pub fn new(daq_list: &DaqList, params: &MeasurementParameters) -> Self {
        let id_field_size = params.id_field_size as u16;
        let swap = codec::requires_swap(params.byte_order);
        DaqListState {
            name: daq_list.name.clone(),
            num_odts: daq_list.odt_count,
            flatten_odts: daq_list.flatten_odts.clone(),
            enable_timestamps: daq_list.enable_timestamps,
            initial_offset: id_field_size,
            swap,
            timestamps_supported: params.timestamps_supported,
            ts_fixed: params.ts_fixed,
            selectable_timestamps: params.selectable_timestamps,
            ts_scale_factor: params.ts_scale_factor,
            ts_size: params.ts_size,
            state: State::Idle,
            next_odt: 0,
            timestamp0: 0,
            timestamp1: 0,
            buffer: Vec::with_capacity(daq_list.total_entries as usize),
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.next_odt = 0;
        self.timestamp0 = 0;
        self.timestamp1 = 0;
        self.buffer.clear();
    }

    /// Feeds one ODT's complete frame payload (the PID is still at the
    /// front; `initial_offset` skips it). `host_timestamp` is the arrival
    /// time supplied by the caller (`timestamp0`).
    pub fn feed(&mut self, odt_num: u16, host_timestamp: u64, payload: &[u8]) -> Result<FeedOutcome> {
        match (self.state, odt_num) {
            (State::Idle, 0) => {
                self.timestamp0 = host_timestamp;
                if let Err(err) = self.parse_odt(0, payload) {
                    self.reset();
                    return Err(err);
                }
                if self.num_odts == 1 {
                    let result = FeedOutcome::Finished(self.timestamp0, self.timestamp1, std::mem::take(&mut self.buffer));
                    self.reset();
                    Ok(result)
                } else {
                    self.state = State::Collecting;
                    self.next_odt = 1;
                    Ok(FeedOutcome::Collecting)
                }
            }
            (State::Collecting, odt) if odt == self.next_odt => {
                self.timestamp0 = host_timestamp;
                if let Err(err) = self.parse_odt(odt, payload) {
                    self.reset();
                    return Err(err);
                }
                self.next_odt += 1;
                if self.next_odt == self.num_odts {
                    let result = FeedOutcome::Finished(self.timestamp0, self.timestamp1, std::mem::take(&mut self.buffer));
                    self.reset();
                    Ok(result)
                } else {
                    Ok(FeedOutcome::Collecting)
                }
            }
            (State::Collecting, odt) => {
                warn!("daq list '{}': expected odt {}, got {}, resetting", self.name, self.next_odt, odt);
                self.reset();
                Ok(FeedOutcome::Error)
            }
            (State::Idle, _) => Ok(FeedOutcome::Ignore),
        }
    }

    fn parse_odt(&mut self, odt_num: u16, payload: &[u8]) -> Result<()> {
        let mut offset = self.initial_offset as usize;

        if odt_num == 0 {
            if self.timestamps_supported && (self.ts_fixed || (self.selectable_timestamps && self.enable_timestamps)) {
                let raw = codec::read_timestamp(payload, offset, self.ts_size)?;
                self.timestamp1 = (raw as f64 * self.ts_scale_factor) as u64;
                offset += self.ts_size as usize;
            } else {
                self.timestamp1 = 0;
            }
        }

        let entries = self
            .flatten_odts
            .get(odt_num as usize)
            .ok_or(XcpCoreError::OffsetOutOfRange)?;
        for entry in entries {
            let value = codec::get(entry.type_index, payload, offset, self.swap)?;
            self.buffer.push(value);
            offset += entry.size as usize;
        }
        Ok(())
    }
}
