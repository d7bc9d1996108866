//-----------------------------------------------------------------------------
// Module xcp_core::daq::params
// Path: src/daq/params.rs
//
// Session-wide decoding context and its binary (de)serialization. Grounded
// on original_source/pyxcp/recorder/unfolder.hpp's MeasurementParameters and
// Deserializer, and writer.hpp's TimestampInfo.

use crate::codec::{ByteOrder, FirstPids};
use crate::daq::daqlist::DaqList;
use crate::daq::mcobject::{read_string, read_u16, read_u64, read_u8, write_string};
use crate::error::{Result, XcpCoreError};

/// Wall-clock anchor recorded once per session: the slave's raw timestamps
/// are offsets from this origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampInfo {
    pub timestamp_ns: u64,
    pub utc_offset: i16,
    pub dst_offset: i16,
}

impl Default for TimestampInfo {
    fn default() -> Self {
        TimestampInfo { timestamp_ns: 0, utc_offset: 0, dst_offset: 0 }
    }
}

/// Session-wide decoding context: produced once per session and immutable
/// thereafter. Must round-trip exactly through `to_bytes`/`from_bytes`
/// (Testable Property 7).
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementParameters {
    pub byte_order: ByteOrder,
    pub id_field_size: u8,
    pub timestamps_supported: bool,
    pub ts_fixed: bool,
    pub prescaler_supported: bool,
    pub selectable_timestamps: bool,
    pub ts_scale_factor: f64,
    pub ts_size: u8,
    pub min_daq: u16,
    pub timestamp_info: TimestampInfo,
    pub timezone: String,
    pub daq_lists: Vec<DaqList>,
    pub first_pids: Vec<u16>,
}

impl MeasurementParameters {
    /// Builds the `FirstPids` lookup table used for `id_field_size == 1`
    /// PID decoding.
    pub fn build_first_pids(&self) -> FirstPids {
        let odt_counts: Vec<u16> = self.daq_lists.iter().map(|l| l.odt_count).collect();
        FirstPids::build(&self.first_pids, &odt_counts)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.push(self.byte_order as u8);
        body.push(self.id_field_size);
        body.push(self.timestamps_supported as u8);
        body.push(self.ts_fixed as u8);
        body.push(self.prescaler_supported as u8);
        body.push(self.selectable_timestamps as u8);
        body.extend_from_slice(&self.ts_scale_factor.to_ne_bytes());
        body.push(self.ts_size);
        body.extend_from_slice(&self.min_daq.to_ne_bytes());
        body.extend_from_slice(&(self.daq_lists.len() as u64).to_ne_bytes());

        body.extend_from_slice(&self.timestamp_info.timestamp_ns.to_ne_bytes());
        write_string(&mut body, &self.timezone);
        body.extend_from_slice(&self.timestamp_info.utc_offset.to_ne_bytes());
        body.extend_from_slice(&self.timestamp_info.dst_offset.to_ne_bytes());

        for daq_list in &self.daq_lists {
            daq_list.dumps(&mut body);
        }

        body.extend_from_slice(&(self.first_pids.len() as u64).to_ne_bytes());
        for fp in &self.first_pids {
            body.extend_from_slice(&fp.to_ne_bytes());
        }

        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(&(body.len() as u64).to_ne_bytes());
        out.extend_from_slice(&body);
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut offset = 0usize;
        let declared_len = read_u64(buf, &mut offset)? as usize;
        if offset + declared_len > buf.len() {
            return Err(XcpCoreError::MalformedMetadata);
        }
        let body_end = offset + declared_len;

        let byte_order = ByteOrder::from_u8(read_u8(buf, &mut offset)?);
        let id_field_size = read_u8(buf, &mut offset)?;
        let timestamps_supported = read_u8(buf, &mut offset)? != 0;
        let ts_fixed = read_u8(buf, &mut offset)? != 0;
        let prescaler_supported = read_u8(buf, &mut offset)? != 0;
        let selectable_timestamps = read_u8(buf, &mut offset)? != 0;
        let ts_scale_factor = f64::from_ne_bytes(read_bytes8(buf, &mut offset)?);
        let ts_size = read_u8(buf, &mut offset)?;
        let min_daq = read_u16(buf, &mut offset)?;
        let dl_count = read_u64(buf, &mut offset)? as usize;

        let timestamp_ns = read_u64(buf, &mut offset)?;
        let timezone = read_string(buf, &mut offset)?;
        let utc_offset = read_u16(buf, &mut offset)? as i16;
        let dst_offset = read_u16(buf, &mut offset)? as i16;

        let mut daq_lists = Vec::with_capacity(dl_count);
        for _ in 0..dl_count {
            daq_lists.push(DaqList::loads(buf, &mut offset)?);
        }

        let fp_count = read_u64(buf, &mut offset)? as usize;
        let mut first_pids = Vec::with_capacity(fp_count);
        for _ in 0..fp_count {
            first_pids.push(read_u16(buf, &mut offset)?);
        }

        if offset != body_end {
            return Err(XcpCoreError::MalformedMetadata);
        }

        Ok(MeasurementParameters {
            byte_order,
            id_field_size,
            timestamps_supported,
            ts_fixed,
            prescaler_supported,
            selectable_timestamps,
            ts_scale_factor,
            ts_size,
            min_daq,
            timestamp_info: TimestampInfo { timestamp_ns, utc_offset, dst_offset },
            timezone,
            daq_lists,
            first_pids,
        })
    }
}

fn read_bytes8(buf: &[u8], offset: &mut usize) -> Result<[u8; 8]> {
    if *offset + 8 > buf.len() {
        return Err(XcpCoreError::MalformedMetadata);
    }
    let arr: [u8; 8] = buf[*offset..*offset + 8].try_into().unwrap();
    *offset += 8;
    Ok(arr)
}
