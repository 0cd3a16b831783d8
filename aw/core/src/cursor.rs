use crate::{CoreError, Result};
use std::sync::Arc;

/// Seekable big-endian reader over an immutable script or shape image.
///
/// Reads have no side effects beyond advancing the offset. Reading past the end
/// of the image is reported as [`CoreError::ScriptOverrun`]; the offset is left
/// where the failed read started.
#[derive(Clone, Debug)]
pub struct Cursor {
    image: Arc<[u8]>,
    offset: usize,
}

impl Cursor {
    pub fn new(image: Arc<[u8]>) -> Self {
        Self { image, offset: 0 }
    }

    pub fn image(&self) -> &Arc<[u8]> {
        &self.image
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    /// Current read position as a 16-bit script offset.
    pub fn offset(&self) -> u16 {
        self.offset as u16
    }

    pub fn seek(&mut self, offset: u16) {
        self.offset = offset as usize;
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.offset + N;
        let bytes = self
            .image
            .get(self.offset..end)
            .ok_or(CoreError::ScriptOverrun {
                offset: self.offset,
                len: self.image.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.offset = end;
        Ok(out)
    }

    pub fn fetch_byte(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn fetch_word(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take::<2>()?))
    }

    pub fn fetch_long(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take::<4>()?))
    }
}
