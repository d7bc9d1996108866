//-----------------------------------------------------------------------------
// Module xcp_core::daq::processor
// Path: src/daq/processor.rs
//
// Dispatches incoming DAQ frames to the correct per-list decoder by PID.
// Grounded on original_source/pyxcp/recorder/unfolder.hpp's DAQProcessor.

use crate::codec::{self, FirstPids, Value};
use crate::daq::decoder::{DaqListState, FeedOutcome};
use crate::daq::params::MeasurementParameters;
use crate::error::Result;

/// A completed DAQ list: `(daq_list_num, timestamp0, timestamp1, values)`.
pub type ListCompletion = (u16, u64, u64, Vec<Value>);

pub struct DaqProcessor {
    lists: Vec<DaqListState>,
    first_pids: FirstPids,
    id_field_size: u8,
}

impl DaqProcessor {
    pub fn new(params: &MeasurementParameters) -> Self {
        let lists = params.daq_lists.iter().map(|list| DaqListState::new(list, params)).collect();
        DaqProcessor {
            lists,
            first_pids: params.build_first_pids(),
            id_field_size: params.id_field_size,
        }
    }

    /// Decodes the PID, forwards the frame to the matching list's state
    /// machine, and returns the completed tuple when that list finishes.
    pub fn feed(&mut self, timestamp: u64, payload: &[u8]) -> Result<Option<ListCompletion>> {
        let (daq_num, odt_num) = codec::read_pid(payload, self.id_field_size, &self.first_pids)?;
        let list = self
            .lists
            .get_mut(daq_num as usize)
            .ok_or(crate::error::XcpCoreError::OffsetOutOfRange)?;
        match list.feed(odt_num, timestamp, payload)? {
            FeedOutcome::Finished(ts0, ts1, values) => Ok(Some((daq_num, ts0, ts1, values))),
            FeedOutcome::Collecting | FeedOutcome::Error | FeedOutcome::Ignore => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteOrder;
    use crate::daq::daqlist::DaqList;
    use crate::daq::mcobject::{Bin, McObject};
    use crate::daq::params::TimestampInfo;

    #[test]
    fn s5_daq_decode_two_byte_pid() {
        let u16_entry = McObject::leaf("speed", 2, 0, "U16").unwrap();
        let f32_entry = McObject::leaf("torque", 4, 0, "F32").unwrap();
        let u8_entry = McObject::leaf("gear", 2, 0, "U8").unwrap();

        let odt0 = McObject::new("odt0", 0, 0, 0, "", vec![u16_entry, f32_entry]).unwrap();
        let odt1 = McObject::new("odt1", 0, 0, 0, "", vec![u8_entry]).unwrap();
        let mut bin0 = Bin::new(0);
        bin0.entries.push(odt0);
        let mut bin1 = Bin::new(0);
        bin1.entries.push(odt1);

        let mut list = DaqList::new("engine", 1, false, false, 0, 1, false, Vec::new());
        list.set_measurements_opt(vec![bin0, bin1]);

        let params = MeasurementParameters {
            byte_order: ByteOrder::Intel,
            id_field_size: 2,
            timestamps_supported: false,
            ts_fixed: false,
            prescaler_supported: false,
            selectable_timestamps: false,
            ts_scale_factor: 1.0,
            ts_size: 0,
            min_daq: 0,
            timestamp_info: TimestampInfo::default(),
            timezone: String::new(),
            daq_lists: vec![list],
            first_pids: vec![0],
        };

        let mut processor = DaqProcessor::new(&params);

        let frame0: [u8; 8] = [0x00, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x20, 0x41];
        assert_eq!(processor.feed(1000, &frame0).unwrap(), None);

        let frame1: [u8; 3] = [0x01, 0x00, 0xFF];
        let completion = processor.feed(1000, &frame1).unwrap().unwrap();
        assert_eq!(completion.0, 0);
        assert_eq!(completion.1, 1000);
        assert_eq!(completion.2, 0);
        assert_eq!(completion.3, vec![Value::U16(42), Value::F32(10.0), Value::U8(255)]);
    }
}
