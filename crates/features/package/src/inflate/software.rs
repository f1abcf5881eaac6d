//! Pure Rust raw deflate decoder (canonical Huffman decoding, RFC 1951).

use crate::error::DecompressionError;
use crate::inflate::Inflater;

const MAX_BITS: usize = 15;
const MAX_LIT_CODES: usize = 286;
const MAX_DIST_CODES: usize = 30;
const FIXED_LIT_CODES: usize = 288;

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];
const LENGTH_EXTRA: [u8; 29] =
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];
/// Order in which code length code lengths are transmitted.
const CODE_LENGTH_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareInflater;

impl Inflater for SoftwareInflater {
    fn name(&self) -> &'static str {
        "software"
    }

    fn inflate(&self, compressed: &[u8], size_hint: usize) -> Result<Vec<u8>, DecompressionError> {
        let mut bits = BitReader::new(compressed);
        let mut out = Vec::with_capacity(size_hint);

        loop {
            let last = bits.take(1)? == 1;
            match bits.take(2)? {
                0 => stored_block(&mut bits, &mut out)?,
                1 => {
                    let (lit, dist) = fixed_tables()?;
                    inflate_block(&mut bits, &mut out, &lit, &dist)?;
                }
                2 => {
                    let (lit, dist) = dynamic_tables(&mut bits)?;
                    inflate_block(&mut bits, &mut out, &lit, &dist)?;
                }
                _ => return Err(DecompressionError::corrupt("invalid block type")),
            }
            if last {
                return Ok(out);
            }
        }
    }
}

/// LSB-first bit reader.
struct BitReader<'a> {
    input: &'a [u8],
    position: usize,
    buffer: u64,
    count: u32,
}

impl<'a> BitReader<'a> {
    const fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0, buffer: 0, count: 0 }
    }

    /// Next `n` bits (`n <= 16`), first bit in the lowest position.
    fn take(&mut self, n: u32) -> Result<u32, DecompressionError> {
        while self.count < n {
            let byte = *self
                .input
                .get(self.position)
                .ok_or_else(|| DecompressionError::corrupt("unexpected end of stream"))?;
            self.position += 1;
            self.buffer |= u64::from(byte) << self.count;
            self.count += 8;
        }
        let value = (self.buffer & ((1u64 << n) - 1)) as u32;
        self.buffer >>= n;
        self.count -= n;
        Ok(value)
    }

    /// Drops the partial byte. Never holds more than 7 pending bits between reads.
    const fn align(&mut self) {
        self.buffer = 0;
        self.count = 0;
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8], DecompressionError> {
        let end = self
            .position
            .checked_add(n)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| DecompressionError::corrupt("stored block exceeds input"))?;
        let slice = &self.input[self.position..end];
        self.position = end;
        Ok(slice)
    }
}

/// Canonical Huffman decoding table: code counts per length and symbols in code order.
struct Huffman {
    counts: [u16; MAX_BITS + 1],
    symbols: Vec<u16>,
}

impl Huffman {
    /// Rejects over-subscribed length sets; incomplete ones fail only when an unused code shows up.
    fn new(lengths: &[u8]) -> Result<Self, DecompressionError> {
        let mut counts = [0u16; MAX_BITS + 1];
        for &len in lengths {
            counts[usize::from(len)] += 1;
        }

        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - i32::from(count);
            if left < 0 {
                return Err(DecompressionError::corrupt("over-subscribed Huffman code"));
            }
        }

        let mut offsets = [0u16; MAX_BITS + 2];
        for len in 1..=MAX_BITS {
            offsets[len + 1] = offsets[len] + counts[len];
        }

        let mut symbols = vec![0u16; lengths.len()];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let slot = &mut offsets[usize::from(len)];
                symbols[usize::from(*slot)] = symbol as u16;
                *slot += 1;
            }
        }

        Ok(Self { counts, symbols })
    }

    fn decode(&self, bits: &mut BitReader<'_>) -> Result<u16, DecompressionError> {
        let mut code: usize = 0;
        let mut first: usize = 0;
        let mut index: usize = 0;

        for len in 1..=MAX_BITS {
            code |= bits.take(1)? as usize;
            let count = usize::from(self.counts[len]);
            if code < first + count {
                return self
                    .symbols
                    .get(index + code - first)
                    .copied()
                    .ok_or_else(|| DecompressionError::corrupt("Huffman symbol out of range"));
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        Err(DecompressionError::corrupt("invalid Huffman code"))
    }
}

fn stored_block(bits: &mut BitReader<'_>, out: &mut Vec<u8>) -> Result<(), DecompressionError> {
    bits.align();
    let header = bits.bytes(4)?;
    let len = u16::from_le_bytes([header[0], header[1]]);
    let nlen = u16::from_le_bytes([header[2], header[3]]);
    if len != !nlen {
        return Err(DecompressionError::corrupt("stored block length check failed"));
    }
    out.extend_from_slice(bits.bytes(usize::from(len))?);
    Ok(())
}

fn fixed_tables() -> Result<(Huffman, Huffman), DecompressionError> {
    let mut lengths = [0u8; FIXED_LIT_CODES];
    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);
    Ok((Huffman::new(&lengths)?, Huffman::new(&[5u8; MAX_DIST_CODES])?))
}

fn dynamic_tables(bits: &mut BitReader<'_>) -> Result<(Huffman, Huffman), DecompressionError> {
    let lit_count = bits.take(5)? as usize + 257;
    let dist_count = bits.take(5)? as usize + 1;
    let code_count = bits.take(4)? as usize + 4;
    if lit_count > MAX_LIT_CODES || dist_count > MAX_DIST_CODES {
        return Err(DecompressionError::corrupt("too many length or distance codes"));
    }

    let mut lengths = [0u8; MAX_LIT_CODES + MAX_DIST_CODES];
    for &slot in &CODE_LENGTH_ORDER[..code_count] {
        lengths[slot] = bits.take(3)? as u8;
    }
    let length_code = Huffman::new(&lengths[..19])?;

    let total = lit_count + dist_count;
    let mut index = 0;
    while index < total {
        let symbol = length_code.decode(bits)?;
        if symbol < 16 {
            lengths[index] = symbol as u8;
            index += 1;
            continue;
        }
        let (value, repeat) = match symbol {
            16 => {
                let previous = index
                    .checked_sub(1)
                    .map(|i| lengths[i])
                    .ok_or_else(|| DecompressionError::corrupt("repeat with no previous length"))?;
                (previous, 3 + bits.take(2)? as usize)
            }
            17 => (0, 3 + bits.take(3)? as usize),
            _ => (0, 11 + bits.take(7)? as usize),
        };
        if index + repeat > total {
            return Err(DecompressionError::corrupt("too many code lengths"));
        }
        lengths[index..index + repeat].fill(value);
        index += repeat;
    }

    if lengths[256] == 0 {
        return Err(DecompressionError::corrupt("missing end-of-block code"));
    }

    Ok((Huffman::new(&lengths[..lit_count])?, Huffman::new(&lengths[lit_count..total])?))
}

fn inflate_block(
    bits: &mut BitReader<'_>,
    out: &mut Vec<u8>,
    lit: &Huffman,
    dist: &Huffman,
) -> Result<(), DecompressionError> {
    loop {
        let symbol = lit.decode(bits)?;
        match symbol {
            0..=255 => out.push(symbol as u8),
            256 => return Ok(()),
            _ => {
                let slot = usize::from(symbol - 257);
                let (Some(&base), Some(&extra)) = (LENGTH_BASE.get(slot), LENGTH_EXTRA.get(slot))
                else {
                    return Err(DecompressionError::corrupt("invalid length symbol"));
                };
                let length = usize::from(base) + bits.take(u32::from(extra))? as usize;

                let slot = usize::from(dist.decode(bits)?);
                let (Some(&base), Some(&extra)) = (DIST_BASE.get(slot), DIST_EXTRA.get(slot))
                else {
                    return Err(DecompressionError::corrupt("invalid distance symbol"));
                };
                let distance = usize::from(base) + bits.take(u32::from(extra))? as usize;

                let start = out
                    .len()
                    .checked_sub(distance)
                    .ok_or_else(|| DecompressionError::corrupt("distance too far back"))?;
                // Overlapping copies repeat the most recent bytes.
                for i in start..start + length {
                    let byte = out[i];
                    out.push(byte);
                }
            }
        }
    }
}
