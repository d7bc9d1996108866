//-----------------------------------------------------------------------------
// Module xcp_core::daq::mcobject
// Path: src/daq/mcobject.rs
//
// Measurable-object and ODT-bin data types. Grounded on
// original_source/pyxcp/cpp_ext/mcobject.hpp and bin.hpp.

use crate::codec::TypeTag;
use crate::error::{Result, XcpCoreError};

/// A measurable memory object: a named, addressed, typed slot (or a
/// composite of nested components).
#[derive(Debug, Clone, PartialEq)]
pub struct McObject {
    pub name: String,
    pub address: u32,
    pub ext: u8,
    pub length: u16,
    pub data_type: String,
    pub type_index: Option<TypeTag>,
    pub components: Vec<McObject>,
}

impl McObject {
    /// `data_type` non-empty derives `length`/`type_index` from the type
    /// table; an unrecognized name is a construction error, matching the
    /// original's `throw std::runtime_error("Invalid data type: ...")`.
    pub fn new(
        name: impl Into<String>,
        address: u32,
        ext: u8,
        length: u16,
        data_type: impl Into<String>,
        components: Vec<McObject>,
    ) -> Result<Self> {
        let data_type = data_type.into();
        let (type_index, length) = if data_type.is_empty() {
            (None, length)
        } else {
            let tag = TypeTag::from_name(&data_type)?;
            (Some(tag), tag.byte_size())
        };
        Ok(McObject {
            name: name.into(),
            address,
            ext,
            length,
            data_type,
            type_index,
            components,
        })
    }

    pub fn leaf(name: impl Into<String>, address: u32, ext: u8, data_type: impl Into<String>) -> Result<Self> {
        McObject::new(name, address, ext, 0, data_type, Vec::new())
    }

    /// Binary representation used both for the stable hash and as the wire
    /// form embedded in log metadata. Mirrors `McObject::dumps()`.
    pub fn dumps(&self, out: &mut Vec<u8>) {
        write_string(out, &self.name);
        out.extend_from_slice(&self.address.to_ne_bytes());
        out.push(self.ext);
        out.extend_from_slice(&self.length.to_ne_bytes());
        write_string(out, &self.data_type);
        let type_index: i16 = self.type_index.map(|t| t as i16).unwrap_or(-1);
        out.extend_from_slice(&type_index.to_ne_bytes());
        out.extend_from_slice(&(self.components.len() as u64).to_ne_bytes());
        for component in &self.components {
            component.dumps(out);
        }
    }

    pub fn loads(buf: &[u8], offset: &mut usize) -> Result<Self> {
        let name = read_string(buf, offset)?;
        let address = read_u32(buf, offset)?;
        let ext = read_u8(buf, offset)?;
        let length = read_u16(buf, offset)?;
        let data_type = read_string(buf, offset)?;
        let type_index_raw = read_i16(buf, offset)?;
        let type_index = if type_index_raw < 0 {
            None
        } else {
            Some(TypeTag::from_u8(type_index_raw as u8)?)
        };
        let component_count = read_u64(buf, offset)? as usize;
        let mut components = Vec::with_capacity(component_count);
        for _ in 0..component_count {
            components.push(McObject::loads(buf, offset)?);
        }
        Ok(McObject {
            name,
            address,
            ext,
            length,
            data_type,
            type_index,
            components,
        })
    }
}

/// A packing unit representing one ODT after bin-packing: a fixed byte
/// budget and the entries assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub size: u16,
    pub residual_capacity: u16,
    pub entries: Vec<McObject>,
}

impl Bin {
    pub fn new(size: u16) -> Self {
        Bin { size, residual_capacity: size, entries: Vec::new() }
    }

    pub fn append(&mut self, entry: McObject) {
        self.residual_capacity = self.residual_capacity.saturating_sub(entry.length);
        self.entries.push(entry);
    }
}

pub(crate) fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_ne_bytes());
    out.extend_from_slice(s.as_bytes());
}

pub(crate) fn read_string(buf: &[u8], offset: &mut usize) -> Result<String> {
    let len = read_u64(buf, offset)? as usize;
    if *offset + len > buf.len() {
        return Err(XcpCoreError::MalformedMetadata);
    }
    let s = std::str::from_utf8(&buf[*offset..*offset + len]).map_err(|_| XcpCoreError::MalformedMetadata)?.to_string();
    *offset += len;
    Ok(s)
}

pub(crate) fn read_u8(buf: &[u8], offset: &mut usize) -> Result<u8> {
    if *offset + 1 > buf.len() {
        return Err(XcpCoreError::MalformedMetadata);
    }
    let v = buf[*offset];
    *offset += 1;
    Ok(v)
}

pub(crate) fn read_u16(buf: &[u8], offset: &mut usize) -> Result<u16> {
    if *offset + 2 > buf.len() {
        return Err(XcpCoreError::MalformedMetadata);
    }
    let v = u16::from_ne_bytes(buf[*offset..*offset + 2].try_into().unwrap());
    *offset += 2;
    Ok(v)
}

pub(crate) fn read_i16(buf: &[u8], offset: &mut usize) -> Result<i16> {
    Ok(read_u16(buf, offset)? as i16)
}

pub(crate) fn read_u32(buf: &[u8], offset: &mut usize) -> Result<u32> {
    if *offset + 4 > buf.len() {
        return Err(XcpCoreError::MalformedMetadata);
    }
    let v = u32::from_ne_bytes(buf[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    Ok(v)
}

pub(crate) fn read_u64(buf: &[u8], offset: &mut usize) -> Result<u64> {
    if *offset + 8 > buf.len() {
        return Err(XcpCoreError::MalformedMetadata);
    }
    let v = u64::from_ne_bytes(buf[*offset..*offset + 8].try_into().unwrap());
    *offset += 8;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_derives_length_and_type_index_from_data_type() {
        let obj = McObject::leaf("speed", 0x1000, 0, "U16").unwrap();
        assert_eq!(obj.length, 2);
        assert_eq!(obj.type_index, Some(TypeTag::U16));
    }

    #[test]
    fn empty_data_type_leaves_type_index_unset() {
        let obj = McObject::new("group", 0x2000, 0, 8, "", Vec::new()).unwrap();
        assert_eq!(obj.type_index, None);
        assert_eq!(obj.length, 8);
    }

    #[test]
    fn unknown_data_type_is_an_error() {
        assert!(McObject::leaf("x", 0, 0, "NOPE").is_err());
    }

    #[test]
    fn dumps_loads_round_trip() {
        let inner = McObject::leaf("child", 0x10, 1, "F32").unwrap();
        let outer = McObject::new("parent", 0x20, 2, 0, "", vec![inner]).unwrap();
        let mut buf = Vec::new();
        outer.dumps(&mut buf);
        let mut offset = 0;
        let decoded = McObject::loads(&buf, &mut offset).unwrap();
        assert_eq!(decoded, outer);
        assert_eq!(offset, buf.len());
    }

    #[test]
    fn bin_append_tracks_residual_capacity() {
        let mut bin = Bin::new(8);
        bin.append(McObject::leaf("a", 0, 0, "U32").unwrap());
        assert_eq!(bin.residual_capacity, 4);
        bin.append(McObject::leaf("b", 0, 0, "U32").unwrap());
        assert_eq!(bin.residual_capacity, 0);
    }
}
