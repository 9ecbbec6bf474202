//! Minimal reader for the big-endian NBT container format.
//!
//! Only what schematic decoding needs: the full tag set is parsed, but there
//! is no writer and no streaming; captures are bounded and read fully in
//! memory. Gzip-wrapped payloads are detected by magic and inflated first.

use crate::core::error::StockpileError;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Tag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(words) => Some(words),
            _ => None,
        }
    }

    /// Compound child lookup, returning a decode error naming the missing key
    /// so malformed containers fail with a reason rather than a panic.
    pub fn child(&self, key: &str) -> Result<&Tag, StockpileError> {
        self.as_compound()
            .and_then(|map| map.get(key))
            .ok_or_else(|| StockpileError::Decode(format!("missing NBT entry: {}", key)))
    }
}

/// Parse a (possibly gzip-wrapped) NBT payload into its named root tag.
pub fn parse(bytes: &[u8]) -> Result<(String, Tag), StockpileError> {
    let inflated;
    let data: &[u8] = if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut decoder = GzDecoder::new(bytes);
        let mut buf = Vec::new();
        decoder
            .read_to_end(&mut buf)
            .map_err(|e| StockpileError::Decode(format!("gzip layer: {}", e)))?;
        inflated = buf;
        &inflated
    } else {
        bytes
    };

    let mut reader = Reader { data, pos: 0 };
    let tag_id = reader.read_u8()?;
    if tag_id != TAG_COMPOUND {
        return Err(StockpileError::Decode(format!(
            "root tag is not a compound (id {})",
            tag_id
        )));
    }
    let name = reader.read_string()?;
    let root = reader.read_payload(TAG_COMPOUND)?;
    Ok((name, root))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], StockpileError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| StockpileError::Decode("unexpected end of NBT data".to_string()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, StockpileError> {
        Ok(self.take(1)?[0])
    }

    fn read_i16(&mut self) -> Result<i16, StockpileError> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn read_i32(&mut self) -> Result<i32, StockpileError> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_i64(&mut self) -> Result<i64, StockpileError> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_string(&mut self) -> Result<String, StockpileError> {
        let len = self.read_i16()? as u16 as usize;
        let raw = self.take(len)?;
        // Modified UTF-8 deviates from UTF-8 only for rare code points; a
        // lossy conversion keeps identifiers usable either way.
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    fn read_payload(&mut self, tag_id: u8) -> Result<Tag, StockpileError> {
        match tag_id {
            TAG_BYTE => Ok(Tag::Byte(self.read_u8()? as i8)),
            TAG_SHORT => Ok(Tag::Short(self.read_i16()?)),
            TAG_INT => Ok(Tag::Int(self.read_i32()?)),
            TAG_LONG => Ok(Tag::Long(self.read_i64()?)),
            TAG_FLOAT => Ok(Tag::Float(f32::from_be_bytes(
                self.take(4)?.try_into().unwrap(),
            ))),
            TAG_DOUBLE => Ok(Tag::Double(f64::from_be_bytes(
                self.take(8)?.try_into().unwrap(),
            ))),
            TAG_BYTE_ARRAY => {
                let len = self.read_len()?;
                let raw = self.take(len)?;
                Ok(Tag::ByteArray(raw.iter().map(|&b| b as i8).collect()))
            }
            TAG_STRING => Ok(Tag::String(self.read_string()?)),
            TAG_LIST => {
                let item_id = self.read_u8()?;
                let len = self.read_len()?;
                if item_id == TAG_END && len > 0 {
                    return Err(StockpileError::Decode(
                        "non-empty list of end tags".to_string(),
                    ));
                }
                let mut items = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    items.push(self.read_payload(item_id)?);
                }
                Ok(Tag::List(items))
            }
            TAG_COMPOUND => {
                let mut map = HashMap::new();
                loop {
                    let child_id = self.read_u8()?;
                    if child_id == TAG_END {
                        break;
                    }
                    let name = self.read_string()?;
                    let value = self.read_payload(child_id)?;
                    map.insert(name, value);
                }
                Ok(Tag::Compound(map))
            }
            TAG_INT_ARRAY => {
                let len = self.read_len()?;
                let mut values = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    values.push(self.read_i32()?);
                }
                Ok(Tag::IntArray(values))
            }
            TAG_LONG_ARRAY => {
                let len = self.read_len()?;
                let mut values = Vec::with_capacity(len.min(1 << 16));
                for _ in 0..len {
                    values.push(self.read_i64()?);
                }
                Ok(Tag::LongArray(values))
            }
            other => Err(StockpileError::Decode(format!(
                "unknown NBT tag id: {}",
                other
            ))),
        }
    }

    fn read_len(&mut self) -> Result<usize, StockpileError> {
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| StockpileError::Decode(format!("negative length: {}", len)))
    }
}
