use crate::error::ArchiveError;

/// Little-endian reader over an immutable buffer.
///
/// `position <= buffer.len()` always holds. A failed read leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Cursor positioned at `position`.
    ///
    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if `position` lies past the end of the buffer.
    pub fn at(buffer: &'a [u8], position: usize) -> Result<Self, ArchiveError> {
        let mut cursor = Self::new(buffer);
        cursor.seek(position)?;
        Ok(cursor)
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if `position` lies past the end of the buffer.
    pub fn seek(&mut self, position: usize) -> Result<(), ArchiveError> {
        if position > self.buffer.len() {
            return Err(self.out_of_bounds(position, 0));
        }
        self.position = position;
        Ok(())
    }

    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> Result<(), ArchiveError> {
        self.read_bytes(n).map(|_| ())
    }

    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16, ArchiveError> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads a `u32` without advancing.
    ///
    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if fewer than 4 bytes remain.
    pub fn peek_u32(&self) -> Result<u32, ArchiveError> {
        self.clone().read_u32()
    }

    /// Borrows the next `n` bytes.
    ///
    /// # Errors
    /// [`ArchiveError::OutOfBounds`] if fewer than `n` bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ArchiveError> {
        let end = self
            .position
            .checked_add(n)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| self.out_of_bounds(self.position, n))?;
        let bytes = &self.buffer[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ArchiveError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    const fn out_of_bounds(&self, offset: usize, wanted: usize) -> ArchiveError {
        ArchiveError::OutOfBounds { offset, wanted, len: self.buffer.len(), context: None }
    }
}
