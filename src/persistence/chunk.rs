//! Little-endian chunk reader/writer for the archive container.

use super::format::CHUNK_HEADER_SIZE;
use super::PersistenceError;

#[derive(Debug, Clone)]
pub struct ChunkHeader {
    pub chunk_type: [u8; 4],
    pub version: u32,
    pub length: u32,
}

pub struct ChunkReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_data(&self) -> bool {
        self.position < self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn try_read_header(&mut self) -> Result<ChunkHeader, PersistenceError> {
        if self.remaining() < CHUNK_HEADER_SIZE {
            return Err(PersistenceError::TruncatedData);
        }
        let chunk_type = self.read_array::<4>()?;
        let version = self.read_u32()?;
        let length = self.read_u32()?;

        Ok(ChunkHeader {
            chunk_type,
            version,
            length,
        })
    }

    pub fn skip_chunk(&mut self, header: &ChunkHeader) -> Result<(), PersistenceError> {
        self.take(header.length as usize).map(|_| ())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PersistenceError> {
        if self.remaining() < len {
            return Err(PersistenceError::TruncatedData);
        }
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PersistenceError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_byte(&mut self) -> Result<u8, PersistenceError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, PersistenceError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Length-prefixed (u32) byte run.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, PersistenceError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, PersistenceError> {
        String::from_utf8(self.read_bytes()?).map_err(|_| PersistenceError::CorruptedData)
    }
}

pub struct ChunkWriter {
    buffer: Vec<u8>,
    chunk_stack: Vec<usize>, // Start positions of nested chunks
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
            chunk_stack: Vec::with_capacity(4),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn begin_chunk(&mut self, chunk_type: [u8; 4], version: u32) {
        self.chunk_stack.push(self.buffer.len());
        self.buffer.extend_from_slice(&chunk_type);
        self.write_u32(version);
        self.write_u32(0); // Placeholder for length
    }

    /// Patches the length of the innermost open chunk. Unbalanced calls are ignored.
    pub fn end_chunk(&mut self) {
        let Some(start_pos) = self.chunk_stack.pop() else {
            return;
        };
        let content_length = self.buffer.len() - start_pos - CHUNK_HEADER_SIZE;
        let length_bytes = (content_length as u32).to_le_bytes();
        self.buffer[start_pos + 8..start_pos + 12].copy_from_slice(&length_bytes);
    }

    pub fn write_byte(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE_TEST_VERSION: u32 = 0x0102_0304;

    #[test]
    fn file_entry_fields_read_back_in_order() {
        let mut out = ChunkWriter::new();
        out.write_byte(b'T');
        out.write_u32(ARCHIVE_TEST_VERSION);
        out.write_string("track.json");
        out.write_bytes(b"{}");
        assert_eq!(out.len(), 1 + 4 + (4 + 10) + (4 + 2));

        let bytes = out.into_bytes();
        let mut input = ChunkReader::new(&bytes);
        assert_eq!(input.read_byte(), Ok(b'T'));
        assert_eq!(input.read_u32(), Ok(ARCHIVE_TEST_VERSION));
        assert_eq!(input.read_string().as_deref(), Ok("track.json"));
        assert_eq!(input.read_bytes(), Ok(b"{}".to_vec()));
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn end_chunk_patches_payload_length() {
        let mut out = ChunkWriter::new();
        out.begin_chunk(*b"FILE", 3);
        out.write_string("a");
        out.write_bytes(&[9; 5]);
        out.end_chunk();
        assert_eq!(out.len(), CHUNK_HEADER_SIZE + 5 + 9);

        let bytes = out.into_bytes();
        let mut input = ChunkReader::new(&bytes);
        let header = input.try_read_header().unwrap();
        assert_eq!(header.chunk_type, *b"FILE");
        assert_eq!(header.version, 3);
        assert_eq!(header.length as usize, 5 + 9);
        assert_eq!(input.position(), CHUNK_HEADER_SIZE);
    }

    #[test]
    fn unbalanced_end_chunk_is_ignored() {
        let mut out = ChunkWriter::new();
        out.end_chunk();
        assert!(out.is_empty());
    }

    #[test]
    fn skip_moves_past_unknown_chunk() {
        let mut writer = ChunkWriter::new();
        writer.begin_chunk(*b"XTRA", 1);
        writer.write_string("ignored");
        writer.end_chunk();
        writer.write_u32(7);

        let data = writer.into_bytes();
        let mut reader = ChunkReader::new(&data);
        let header = reader.try_read_header().unwrap();
        reader.skip_chunk(&header).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 7);
    }

    #[test]
    fn truncated_input_is_reported() {
        let mut writer = ChunkWriter::new();
        writer.write_u32(100); // claims 100 bytes follow
        writer.write_byte(1);

        let data = writer.into_bytes();
        let mut reader = ChunkReader::new(&data);
        assert_eq!(reader.read_bytes(), Err(PersistenceError::TruncatedData));
        assert_eq!(ChunkReader::new(&[1, 2]).read_u32(), Err(PersistenceError::TruncatedData));
    }

    #[test]
    fn invalid_utf8_is_corrupted() {
        let mut writer = ChunkWriter::new();
        writer.write_bytes(&[0xff, 0xfe]);
        let data = writer.into_bytes();
        assert_eq!(
            ChunkReader::new(&data).read_string(),
            Err(PersistenceError::CorruptedData)
        );
    }
}
