//-----------------------------------------------------------------------------
// Module xcp_core::codec
// Path: src/codec.rs
//
// Byte-order- and type-aware reads/writes over DAQ payload buffers, plus PID
// and timestamp decoding. Grounded on original_source/pyxcp/recorder/unfolder.hpp
// (Getter/Setter, requires_swap, get_id, get_timestamp) and
// original_source/pyxcp/cpp_ext/mcobject.hpp (TYPE_MAP).

use byteorder::{ByteOrder as _, BigEndian, LittleEndian};

use crate::error::{Result, XcpCoreError};

/// Session-wide byte order, as advertised by the slave in `CONNECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Intel = 0,
    Motorola = 1,
}

impl ByteOrder {
    pub fn from_u8(v: u8) -> Self {
        if v == 1 {
            ByteOrder::Motorola
        } else {
            ByteOrder::Intel
        }
    }
}

/// `true` iff values encoded in `bo` must be byte-swapped to be read with
/// native multi-byte primitives on this host. Decided once per session.
pub fn requires_swap(bo: ByteOrder) -> bool {
    let wire_is_big = matches!(bo, ByteOrder::Motorola);
    let host_is_big = cfg!(target_endian = "big");
    wire_is_big != host_is_big
}

/// Stable type tag, matching the original's `TYPE_MAP` / `TypeCode` ordering.
/// The tag-to-size mapping is fixed and must match across writer and reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    U8 = 0,
    I8 = 1,
    U16 = 2,
    I16 = 3,
    U32 = 4,
    I32 = 5,
    U64 = 6,
    I64 = 7,
    F32 = 8,
    F64 = 9,
    F16 = 10,
    Bf16 = 11,
}

impl TypeTag {
    pub fn from_u8(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => TypeTag::U8,
            1 => TypeTag::I8,
            2 => TypeTag::U16,
            3 => TypeTag::I16,
            4 => TypeTag::U32,
            5 => TypeTag::I32,
            6 => TypeTag::U64,
            7 => TypeTag::I64,
            8 => TypeTag::F32,
            9 => TypeTag::F64,
            10 => TypeTag::F16,
            11 => TypeTag::Bf16,
            other => return Err(XcpCoreError::UnsupportedType(other)),
        })
    }

    /// Byte width of this type on the wire. F16/BF16 are always 2 bytes even
    /// though this build cannot decode their contents.
    pub fn byte_size(self) -> u16 {
        match self {
            TypeTag::U8 | TypeTag::I8 => 1,
            TypeTag::U16 | TypeTag::I16 | TypeTag::F16 | TypeTag::Bf16 => 2,
            TypeTag::U32 | TypeTag::I32 | TypeTag::F32 => 4,
            TypeTag::U64 | TypeTag::I64 | TypeTag::F64 => 8,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "U8" => Ok(TypeTag::U8),
            "I8" => Ok(TypeTag::I8),
            "U16" => Ok(TypeTag::U16),
            "I16" => Ok(TypeTag::I16),
            "U32" => Ok(TypeTag::U32),
            "I32" => Ok(TypeTag::I32),
            "U64" => Ok(TypeTag::U64),
            "I64" => Ok(TypeTag::I64),
            "F32" => Ok(TypeTag::F32),
            "F64" => Ok(TypeTag::F64),
            "F16" => Ok(TypeTag::F16),
            "BF16" => Ok(TypeTag::Bf16),
            other => Err(XcpCoreError::UnknownDataType(other.to_string())),
        }
    }
}

/// A decoded measurement value. F16/BF16 never appear here: decoding either
/// tag fails with `UnsupportedType` since this build carries no half-float
/// support (see SPEC_FULL.md §A.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

fn need(buf: &[u8], offset: usize, len: usize) -> Result<()> {
    if offset + len > buf.len() {
        Err(XcpCoreError::OffsetOutOfRange)
    } else {
        Ok(())
    }
}

/// Read a typed value at `offset`, swapping bytes when `swap` is set.
pub fn get(tag: TypeTag, buf: &[u8], offset: usize, swap: bool) -> Result<Value> {
    let size = tag.byte_size() as usize;
    need(buf, offset, size)?;
    let s = &buf[offset..offset + size];
    Ok(match tag {
        TypeTag::U8 => Value::U8(s[0]),
        TypeTag::I8 => Value::I8(s[0] as i8),
        TypeTag::U16 => Value::U16(read_u16(s, swap)),
        TypeTag::I16 => Value::I16(read_u16(s, swap) as i16),
        TypeTag::U32 => Value::U32(read_u32(s, swap)),
        TypeTag::I32 => Value::I32(read_u32(s, swap) as i32),
        TypeTag::U64 => Value::U64(read_u64(s, swap)),
        TypeTag::I64 => Value::I64(read_u64(s, swap) as i64),
        TypeTag::F32 => Value::F32(f32::from_bits(read_u32(s, swap))),
        TypeTag::F64 => Value::F64(f64::from_bits(read_u64(s, swap))),
        TypeTag::F16 | TypeTag::Bf16 => return Err(XcpCoreError::UnsupportedType(tag as u8)),
    })
}

/// Write a typed value at `offset`, swapping bytes when `swap` is set.
pub fn set(tag: TypeTag, buf: &mut [u8], offset: usize, value: Value, swap: bool) -> Result<()> {
    let size = tag.byte_size() as usize;
    if offset + size > buf.len() {
        return Err(XcpCoreError::OffsetOutOfRange);
    }
    let d = &mut buf[offset..offset + size];
    match value {
        Value::U8(v) => d[0] = v,
        Value::I8(v) => d[0] = v as u8,
        Value::U16(v) => write_u16(d, v, swap),
        Value::I16(v) => write_u16(d, v as u16, swap),
        Value::U32(v) => write_u32(d, v, swap),
        Value::I32(v) => write_u32(d, v as u32, swap),
        Value::U64(v) => write_u64(d, v, swap),
        Value::I64(v) => write_u64(d, v as u64, swap),
        Value::F32(v) => write_u32(d, v.to_bits(), swap),
        Value::F64(v) => write_u64(d, v.to_bits(), swap),
    }
    Ok(())
}

fn read_u16(s: &[u8], swap: bool) -> u16 {
    if swap {
        BigEndian::read_u16(s)
    } else {
        LittleEndian::read_u16(s)
    }
}
fn read_u32(s: &[u8], swap: bool) -> u32 {
    if swap {
        BigEndian::read_u32(s)
    } else {
        LittleEndian::read_u32(s)
    }
}
fn read_u64(s: &[u8], swap: bool) -> u64 {
    if swap {
        BigEndian::read_u64(s)
    } else {
        LittleEndian::read_u64(s)
    }
}
fn write_u16(d: &mut [u8], v: u16, swap: bool) {
    if swap {
        BigEndian::write_u16(d, v)
    } else {
        LittleEndian::write_u16(d, v)
    }
}
fn write_u32(d: &mut [u8], v: u32, swap: bool) {
    if swap {
        BigEndian::write_u32(d, v)
    } else {
        LittleEndian::write_u32(d, v)
    }
}
fn write_u64(d: &mut [u8], v: u64, swap: bool) {
    if swap {
        BigEndian::write_u64(d, v)
    } else {
        LittleEndian::write_u64(d, v)
    }
}

/// Read the ODT-0 ECU timestamp. Zero-length reads return 0; only 1/2/4
/// byte widths are otherwise supported.
pub fn read_timestamp(buf: &[u8], offset: usize, ts_size: u8) -> Result<u64> {
    match ts_size {
        0 => Ok(0),
        1 => {
            need(buf, offset, 1)?;
            Ok(buf[offset] as u64)
        }
        2 => {
            need(buf, offset, 2)?;
            Ok(LittleEndian::read_u16(&buf[offset..offset + 2]) as u64)
        }
        4 => {
            need(buf, offset, 4)?;
            Ok(LittleEndian::read_u32(&buf[offset..offset + 4]) as u64)
        }
        other => Err(XcpCoreError::UnsupportedTimestampSize(other)),
    }
}

/// A lookup table from absolute PID to `(daq_list_num, odt_num)`, used only
/// when `id_field_size == 1`. Built once per session from each list's
/// `first_pid` and `odt_count`.
#[derive(Debug, Default, Clone)]
pub struct FirstPids {
    map: std::collections::HashMap<u16, (u16, u16)>,
}

impl FirstPids {
    pub fn build(first_pids: &[u16], odt_counts: &[u16]) -> Self {
        let mut map = std::collections::HashMap::new();
        for (daq_num, (&first_pid, &odt_count)) in first_pids.iter().zip(odt_counts.iter()).enumerate() {
            for odt in 0..odt_count {
                map.insert(first_pid + odt, (daq_num as u16, odt));
            }
        }
        FirstPids { map }
    }

    pub fn lookup(&self, pid: u16) -> Result<(u16, u16)> {
        self.map.get(&pid).copied().ok_or(XcpCoreError::OffsetOutOfRange)
    }
}

/// Decode the PID field into `(daq_list_num, odt_num)` per the rules driven
/// by `id_field_size`. See SPEC_FULL.md's Open Question notes for the
/// rationale behind the `id_field_size == 3` layout.
pub fn read_pid(buf: &[u8], id_field_size: u8, first_pids: &FirstPids) -> Result<(u16, u16)> {
    match id_field_size {
        1 => {
            need(buf, 0, 1)?;
            first_pids.lookup(buf[0] as u16)
        }
        2 => {
            need(buf, 0, 2)?;
            let odt = buf[0] as u16;
            let daq = buf[1] as u16;
            Ok((daq, odt))
        }
        3 => {
            need(buf, 0, 3)?;
            let odt = buf[0] as u16;
            let daq = LittleEndian::read_u16(&buf[1..3]);
            Ok((daq, odt))
        }
        4 => {
            need(buf, 0, 4)?;
            let odt = buf[0] as u16;
            let daq = LittleEndian::read_u16(&buf[2..4]);
            Ok((daq, odt))
        }
        other => Err(XcpCoreError::UnsupportedIdSize(other)),
    }
}
