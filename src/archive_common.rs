use std::io::Cursor;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::constants::{EXTRA_FIELD_HEADER_SIZE, ZIP64_EXTENSIBLE_HEADER_SIZE};
use crate::error::ArchiveError;

/// Little-endian record builder.
#[derive(Debug, Default)]
pub struct ArchiveDescriptor {
    buffer: Vec<u8>,
}

impl ArchiveDescriptor {
    pub fn new(capacity: usize) -> ArchiveDescriptor {
        ArchiveDescriptor {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buffer.push(val);
    }

    pub fn write_u16(&mut self, val: u16) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32(&mut self, val: u32) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u64(&mut self, val: u64) {
        self.buffer.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_bytes(&mut self, val: &[u8]) {
        self.buffer.extend_from_slice(val);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

/// Bounds-checked little-endian cursor over a record.
///
/// Every read reports a truncated `record` instead of panicking on short input.
pub struct ArchiveDescriptorReader<'a> {
    cursor: Cursor<&'a [u8]>,
    record: &'static str,
}

macro_rules! read_type {
    ($self:expr, $method:ident, $typ:ty) => {{
        let needed = $self.index() + ::std::mem::size_of::<$typ>();
        let total = $self.total();
        let record = $self.record;
        $self
            .cursor
            .$method::<LittleEndian>()
            .map_err(|_| ArchiveError::truncated(record, needed, total))
    }};
}

impl<'a> ArchiveDescriptorReader<'a> {
    pub fn new(stream: &'a [u8], record: &'static str) -> Self {
        ArchiveDescriptorReader {
            cursor: Cursor::new(stream),
            record,
        }
    }

    pub fn index(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn set_index(&mut self, index: usize) {
        self.cursor.set_position(index as u64);
    }

    fn total(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn remaining(&self) -> usize {
        self.total().saturating_sub(self.index())
    }

    pub fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        let (needed, total, record) = (self.index() + 1, self.total(), self.record);
        self.cursor
            .read_u8()
            .map_err(|_| ArchiveError::truncated(record, needed, total))
    }

    pub fn read_u16(&mut self) -> Result<u16, ArchiveError> {
        read_type!(self, read_u16, u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        read_type!(self, read_u32, u32)
    }

    pub fn read_u64(&mut self) -> Result<u64, ArchiveError> {
        read_type!(self, read_u64, u64)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, ArchiveError> {
        let needed = self.index() + len;
        if self.remaining() < len {
            return Err(ArchiveError::truncated(self.record, needed, self.total()));
        }
        let mut value = vec![0; len];
        self.cursor.read_exact(&mut value)?;
        Ok(value)
    }

    /// Names are decoded leniently, invalid UTF-8 sequences are replaced.
    pub fn read_utf8_string(&mut self, len: usize) -> Result<String, ArchiveError> {
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn expect_signature(&mut self, signature: u32) -> Result<(), ArchiveError> {
        let found = self.read_u32()?;
        if found != signature {
            return Err(ArchiveError::BadArchiveStructure(format!(
                "Invalid {} signature: expected {:#010x}, found {:#010x}",
                self.record, signature, found
            )));
        }
        Ok(())
    }
}

/// Ordered table of extra fields, keyed by header id.
///
/// Ids are unique: inserting an existing id replaces its payload in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraData {
    fields: Vec<(u16, Vec<u8>)>,
}

impl ExtraData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u16, data: Vec<u8>) -> Option<Vec<u8>> {
        match self.fields.iter_mut().find(|(key, _)| *key == id) {
            Some((_, existing)) => Some(std::mem::replace(existing, data)),
            None => {
                self.fields.push((id, data));
                None
            }
        }
    }

    pub fn get(&self, id: u16) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, data)| data.as_slice())
    }

    pub fn remove(&mut self, id: u16) -> Option<Vec<u8>> {
        let position = self.fields.iter().position(|(key, _)| *key == id)?;
        Some(self.fields.remove(position).1)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &[u8])> {
        self.fields.iter().map(|(id, data)| (*id, data.as_slice()))
    }

    /// Size of the encoded table with 16-bit length prefixes.
    pub fn encoded_len(&self) -> usize {
        self.fields
            .iter()
            .map(|(_, data)| EXTRA_FIELD_HEADER_SIZE + data.len())
            .sum()
    }

    pub(crate) fn write(&self, descriptor: &mut ArchiveDescriptor) {
        for (id, data) in &self.fields {
            descriptor.write_u16(*id);
            descriptor.write_u16(data.len() as u16);
            descriptor.write_bytes(data);
        }
    }

    /// `id u16, length u16, data` records back to back.
    pub fn encode(&self) -> Vec<u8> {
        let mut descriptor = ArchiveDescriptor::new(self.encoded_len());
        self.write(&mut descriptor);
        descriptor.finish()
    }

    /// Decoding stops once fewer than 4 bytes remain; a payload running past the end is an error.
    pub fn decode(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut indexer = ArchiveDescriptorReader::new(bytes, "extra field");
        let mut extra = ExtraData::new();

        while indexer.remaining() >= EXTRA_FIELD_HEADER_SIZE {
            let id = indexer.read_u16()?;
            let len = indexer.read_u16()? as usize;
            let data = indexer.read_bytes(len)?;
            extra.insert(id, data);
        }

        Ok(extra)
    }

    /// Zip64 extensible data sector form: `id u16, length u32, data`.
    pub fn encoded_len_wide(&self) -> usize {
        self.fields
            .iter()
            .map(|(_, data)| ZIP64_EXTENSIBLE_HEADER_SIZE + data.len())
            .sum()
    }

    pub(crate) fn write_wide(&self, descriptor: &mut ArchiveDescriptor) {
        for (id, data) in &self.fields {
            descriptor.write_u16(*id);
            descriptor.write_u32(data.len() as u32);
            descriptor.write_bytes(data);
        }
    }

    pub fn decode_wide(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut indexer = ArchiveDescriptorReader::new(bytes, "zip64 extensible data");
        let mut extra = ExtraData::new();

        while indexer.remaining() >= ZIP64_EXTENSIBLE_HEADER_SIZE {
            let id = indexer.read_u16()?;
            let len = indexer.read_u32()? as usize;
            let data = indexer.read_bytes(len)?;
            extra.insert(id, data);
        }

        Ok(extra)
    }
}

impl FromIterator<(u16, Vec<u8>)> for ExtraData {
    fn from_iter<T: IntoIterator<Item = (u16, Vec<u8>)>>(iter: T) -> Self {
        let mut extra = ExtraData::new();
        for (id, data) in iter {
            extra.insert(id, data);
        }
        extra
    }
}
