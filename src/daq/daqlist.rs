//-----------------------------------------------------------------------------
// Module xcp_core::daq::daqlist
// Path: src/daq/daqlist.rs
//
// DAQ list configuration and ODT flattening. Grounded on
// original_source/pyxcp/cpp_ext/daqlist.hpp (DaqListBase::set_measurements_opt,
// DaqList::dumps, PredefinedDaqList::dumps).

use crate::codec::TypeTag;
use crate::daq::mcobject::{read_string, read_u16, read_u32, read_u64, read_u8, write_string, Bin, McObject};
use crate::error::Result;

/// One flattened ODT entry: the fields the decoder needs to read one typed
/// slot out of a payload, independent of the `McObject` tree it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub name: String,
    pub address: u32,
    pub ext: u8,
    pub size: u16,
    pub type_index: TypeTag,
}

/// A DAQ list: the decoder-facing configuration of one event-triggered group
/// of ODTs. Built either from free-form measurements (bin-packed externally)
/// or from a predefined ODT layout; either way it is reduced to
/// `measurements_opt` (one `Bin` per ODT) before use by the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DaqList {
    pub name: String,
    pub event_num: u16,
    pub stim: bool,
    pub enable_timestamps: bool,
    pub priority: u8,
    pub prescaler: u8,
    pub predefined: bool,
    pub measurements: Vec<McObject>,
    pub measurements_opt: Vec<Bin>,
    pub flatten_odts: Vec<Vec<FlatEntry>>,
    pub odt_count: u16,
    pub total_entries: u16,
    pub total_length: u16,
    pub header_names: Vec<String>,
}

impl DaqList {
    pub fn new(
        name: impl Into<String>,
        event_num: u16,
        stim: bool,
        enable_timestamps: bool,
        priority: u8,
        prescaler: u8,
        predefined: bool,
        measurements: Vec<McObject>,
    ) -> Self {
        DaqList {
            name: name.into(),
            event_num,
            stim,
            enable_timestamps,
            priority,
            prescaler,
            predefined,
            measurements,
            measurements_opt: Vec::new(),
            flatten_odts: Vec::new(),
            odt_count: 0,
            total_entries: 0,
            total_length: 0,
            header_names: Vec::new(),
        }
    }

    /// Assigns the bin-packed ODT layout and derives `flatten_odts`,
    /// `odt_count`, `total_entries`, `total_length`, `header_names`.
    ///
    /// A `Bin`'s own entries are treated as composite `McObject`s whose
    /// `components` are the actual typed slots transmitted on the wire,
    /// mirroring the original's iteration over `mc_obj.get_components()`.
    pub fn set_measurements_opt(&mut self, measurements_opt: Vec<Bin>) {
        let mut flatten_odts = Vec::with_capacity(measurements_opt.len());
        let mut header_names = Vec::new();
        let mut total_entries: u16 = 0;
        let mut total_length: u16 = 0;

        for bin in &measurements_opt {
            let mut flat = Vec::new();
            for mc_obj in &bin.entries {
                for component in &mc_obj.components {
                    header_names.push(component.name.clone());
                    let type_index = component.type_index.expect("flattened component must carry a type");
                    flat.push(FlatEntry {
                        name: component.name.clone(),
                        address: component.address,
                        ext: component.ext,
                        size: component.length,
                        type_index,
                    });
                    total_entries += 1;
                    total_length += component.length;
                }
            }
            flatten_odts.push(flat);
        }

        self.odt_count = measurements_opt.len() as u16;
        self.total_entries = total_entries;
        self.total_length = total_length;
        self.header_names = header_names;
        self.measurements_opt = measurements_opt;
        self.flatten_odts = flatten_odts;
    }

    /// Binary encoding used by the log's embedded metadata block. Discriminant
    /// byte `1` marks a free-form `DaqList`, matching the original's `discr`.
    pub fn dumps(&self, out: &mut Vec<u8>) {
        out.push(1u8);
        write_string(out, &self.name);
        out.extend_from_slice(&self.event_num.to_ne_bytes());
        out.push(self.stim as u8);
        out.push(self.enable_timestamps as u8);
        out.push(self.priority);
        out.push(self.prescaler);
        out.push(self.predefined as u8);
        out.extend_from_slice(&self.odt_count.to_ne_bytes());
        out.extend_from_slice(&self.total_entries.to_ne_bytes());
        out.extend_from_slice(&self.total_length.to_ne_bytes());

        out.extend_from_slice(&(self.measurements.len() as u64).to_ne_bytes());
        for mc_obj in &self.measurements {
            mc_obj.dumps(out);
        }
        out.extend_from_slice(&(self.measurements_opt.len() as u64).to_ne_bytes());
        for bin in &self.measurements_opt {
            dumps_bin(bin, out);
        }
        out.extend_from_slice(&(self.header_names.len() as u64).to_ne_bytes());
        for name in &self.header_names {
            write_string(out, name);
        }
    }

    pub fn loads(buf: &[u8], offset: &mut usize) -> Result<Self> {
        let _discr = read_u8(buf, offset)?;
        let name = read_string(buf, offset)?;
        let event_num = read_u16(buf, offset)?;
        let stim = read_u8(buf, offset)? != 0;
        let enable_timestamps = read_u8(buf, offset)? != 0;
        let priority = read_u8(buf, offset)?;
        let prescaler = read_u8(buf, offset)?;
        let predefined = read_u8(buf, offset)? != 0;
        let odt_count = read_u16(buf, offset)?;
        let total_entries = read_u16(buf, offset)?;
        let total_length = read_u16(buf, offset)?;

        let meas_count = read_u64(buf, offset)? as usize;
        let mut measurements = Vec::with_capacity(meas_count);
        for _ in 0..meas_count {
            measurements.push(McObject::loads(buf, offset)?);
        }
        let meas_opt_count = read_u64(buf, offset)? as usize;
        let mut measurements_opt = Vec::with_capacity(meas_opt_count);
        for _ in 0..meas_opt_count {
            measurements_opt.push(loads_bin(buf, offset)?);
        }
        let hname_count = read_u64(buf, offset)? as usize;
        let mut header_names = Vec::with_capacity(hname_count);
        for _ in 0..hname_count {
            header_names.push(read_string(buf, offset)?);
        }

        let mut list = DaqList::new(name, event_num, stim, enable_timestamps, priority, prescaler, predefined, measurements);
        list.set_measurements_opt(measurements_opt);
        // Recorded totals must match the freshly-derived ones.
        debug_assert_eq!(list.odt_count, odt_count);
        debug_assert_eq!(list.total_entries, total_entries);
        debug_assert_eq!(list.total_length, total_length);
        debug_assert_eq!(list.header_names, header_names);
        Ok(list)
    }
}

fn dumps_bin(bin: &Bin, out: &mut Vec<u8>) {
    out.extend_from_slice(&bin.size.to_ne_bytes());
    out.extend_from_slice(&bin.residual_capacity.to_ne_bytes());
    out.extend_from_slice(&(bin.entries.len() as u64).to_ne_bytes());
    for entry in &bin.entries {
        entry.dumps(out);
    }
}

fn loads_bin(buf: &[u8], offset: &mut usize) -> Result<Bin> {
    let size = read_u16(buf, offset)?;
    let residual_capacity = read_u16(buf, offset)?;
    let entry_count = read_u64(buf, offset)? as usize;
    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        entries.push(McObject::loads(buf, offset)?);
    }
    Ok(Bin { size, residual_capacity, entries })
}

/// Constructs a `DaqList` directly from a predefined ODT layout: each inner
/// `Vec<McObject>` becomes one `Bin`/ODT, its entries given as components of
/// a single wrapping `McObject` so `set_measurements_opt`'s component walk
/// applies uniformly. Grounded on `PredefinedDaqList`.
pub fn predefined_daq_list(
    name: impl Into<String>,
    event_num: u16,
    stim: bool,
    enable_timestamps: bool,
    odts: Vec<Vec<McObject>>,
) -> Result<DaqList> {
    let mut list = DaqList::new(name, event_num, stim, enable_timestamps, 0, 1, true, Vec::new());
    let mut measurements_opt = Vec::with_capacity(odts.len());
    for entries in odts {
        let wrapper = McObject::new("odt", 0, 0, 0, "", entries)?;
        let mut bin = Bin::new(0);
        bin.entries.push(wrapper);
        measurements_opt.push(bin);
    }
    list.set_measurements_opt(measurements_opt);
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> DaqList {
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
        list
    }

    #[test]
    fn derived_totals_satisfy_invariants() {
        let list = sample_list();
        assert_eq!(list.odt_count as usize, list.measurements_opt.len());
        assert_eq!(list.total_length, list.flatten_odts.iter().flatten().map(|e| e.size).sum::<u16>());
        assert_eq!(list.total_entries as usize, list.flatten_odts.iter().flatten().count());
    }

    #[test]
    fn dumps_loads_round_trip() {
        let list = sample_list();
        let mut buf = Vec::new();
        list.dumps(&mut buf);
        let mut offset = 0;
        let decoded = DaqList::loads(&buf, &mut offset).unwrap();
        assert_eq!(decoded.odt_count, list.odt_count);
        assert_eq!(decoded.total_entries, list.total_entries);
        assert_eq!(decoded.total_length, list.total_length);
        assert_eq!(decoded.flatten_odts, list.flatten_odts);
        assert_eq!(decoded.priority, list.priority);
        assert_eq!(offset, buf.len());
    }

    #[test]
    fn dumps_loads_round_trip_preserves_nonzero_priority() {
        let mut list = sample_list();
        list.priority = 7;
        let mut buf = Vec::new();
        list.dumps(&mut buf);
        let mut offset = 0;
        let decoded = DaqList::loads(&buf, &mut offset).unwrap();
        assert_eq!(decoded.priority, 7);
    }

    #[test]
    fn predefined_daq_list_builds_flatten_odts() {
        let odts = vec![
            vec![McObject::leaf("a", 0, 0, "U16").unwrap()],
            vec![McObject::leaf("b", 0, 0, "U8").unwrap()],
        ];
        let list = predefined_daq_list("predef", 1, false, false, odts).unwrap();
        assert!(list.predefined);
        assert_eq!(list.odt_count, 2);
        assert_eq!(list.flatten_odts[0][0].type_index, TypeTag::U16);
    }
}
