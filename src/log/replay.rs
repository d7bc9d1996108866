//-----------------------------------------------------------------------------
// Module xcp_core::log::replay
// Path: src/log/replay.rs
//
// Composes reader -> DAQ filter -> processor -> callback. Grounded on
// original_source/pyxcp/recorder/unfolder.hpp's XcpLogFileDecoder.

use crate::daq::{DaqProcessor, ListCompletion, MeasurementParameters};
use crate::error::{Result, XcpCoreError};
use crate::log::format::FrameCategory;
use crate::log::reader::LogReader;

/// Replays a log file's DAQ frames through the same decoder logic an
/// online session would have used, producing an identical sequence of
/// completed DAQ lists (Testable Property 8).
///
/// Construction fails with `MissingMetadata` if the file carries no
/// embedded `MeasurementParameters` block — diverging from the original,
/// which silently proceeds with an unusable decoder in that case.
pub struct LogReplayDecoder {
    reader: LogReader,
    processor: DaqProcessor,
    params: MeasurementParameters,
}

impl LogReplayDecoder {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let reader = LogReader::open(path)?;
        let metadata = reader.metadata().ok_or(XcpCoreError::MissingMetadata)?;
        let params = MeasurementParameters::from_bytes(metadata)?;
        let processor = DaqProcessor::new(&params);
        Ok(LogReplayDecoder { reader, processor, params })
    }

    pub fn parameters(&self) -> &MeasurementParameters {
        &self.params
    }

    /// Drives the reader to completion, invoking `on_list` for every
    /// completed DAQ list in file order.
    pub fn run<F>(&mut self, mut on_list: F) -> Result<()>
    where
        F: FnMut(ListCompletion),
    {
        while let Some(block) = self.reader.next_block()? {
            for frame in block {
                let Some(category) = FrameCategory::from_u8(frame.category) else { continue };
                if category != FrameCategory::Daq {
                    continue;
                }
                if let Some(completion) = self.processor.feed(frame.timestamp, &frame.payload)? {
                    on_list(completion);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daq::{DaqList, TimestampInfo};
    use crate::daq::mcobject::{Bin, McObject};
    use crate::log::format::FrameCategory;
    use crate::log::writer::LogWriter;
    use crate::policy::{FramePolicy, OnlineDecoderPolicy};

    fn sample_params() -> MeasurementParameters {
        let u16_entry = McObject::leaf("speed", 2, 0, "U16").unwrap();
        let odt0 = McObject::new("odt0", 0, 0, 0, "", vec![u16_entry]).unwrap();
        let mut bin0 = Bin::new(0);
        bin0.entries.push(odt0);
        let mut list = DaqList::new("engine", 1, false, false, 0, 1, false, Vec::new());
        list.set_measurements_opt(vec![bin0]);

        MeasurementParameters {
            byte_order: crate::codec::ByteOrder::Intel,
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
        }
    }

    #[test]
    fn replay_without_metadata_fails_to_construct() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_meta.xmraw");
        let mut writer = LogWriter::open(&path, 1, 1024, None).unwrap();
        writer.add_frame(FrameCategory::Daq as u8, 0, 0, &[0x00, 0x00, 0x01, 0x00]);
        writer.finalize().unwrap();

        assert!(matches!(LogReplayDecoder::open(&path), Err(XcpCoreError::MissingMetadata)));
    }

    #[test]
    fn replay_matches_online_decoding() {
        let params = sample_params();
        let metadata = params.to_bytes();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.xmraw");

        let frames: Vec<(u16, u64, Vec<u8>)> = vec![
            (0, 100, vec![0x00, 0x00, 0x2A, 0x00]),
            (1, 200, vec![0x00, 0x00, 0x01, 0x00]),
        ];

        {
            let mut writer = LogWriter::open(&path, 1, 1024, Some(&metadata)).unwrap();
            for (ctr, ts, payload) in &frames {
                writer.add_frame(FrameCategory::Daq as u8, *ctr, *ts, payload);
            }
            writer.finalize().unwrap();
        }

        let mut online_results = Vec::new();
        {
            let mut policy = OnlineDecoderPolicy::new(&params, |completion| online_results.push(completion));
            for (ctr, ts, payload) in &frames {
                policy.feed(FrameCategory::Daq, *ctr, *ts, payload);
            }
        }

        let mut replay_results = Vec::new();
        let mut decoder = LogReplayDecoder::open(&path).unwrap();
        decoder.run(|completion| replay_results.push(completion)).unwrap();

        assert_eq!(replay_results, online_results);
    }
}
