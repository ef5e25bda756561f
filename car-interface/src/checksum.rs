//! Chrysler/Jeep CAN security checksum
//!
//! Bit-serial, MSB-first fold over all input bytes with an 8-bit register
//! seeded with `0xFF`; the result is the complement of the final register.
//! The register is kept in a `u8`, so every shift is masked to 8 bits. Bits
//! shifted out of the top never feed back into the low byte, which makes the
//! masked form bit-identical to the unmasked reference (see the vector tests).

use crate::types::{CarError, Result};

const SEED: u8 = 0xFF;

/// Compute the checksum over `data`, which must not contain the checksum
/// byte itself.
///
/// Empty input has no defined checksum and yields
/// [`CarError::EmptyChecksumInput`].
pub fn checksum(data: &[u8]) -> Result<u8> {
    if data.is_empty() {
        return Err(CarError::EmptyChecksumInput);
    }

    let mut register = SEED;
    for &byte in data {
        for bit in (0..8).rev() {
            let top_bit = register & 0x80 != 0;
            let folded = if byte & (1 << bit) != 0 {
                let fold: u8 = if top_bit { 0x01 } else { 0x1C };
                register <<= 1;
                fold ^ (register | 1)
            } else {
                let fold: u8 = if top_bit { 0x1D } else { 0x00 };
                register <<= 1;
                fold ^ register
            };
            register = folded;
        }
    }

    Ok(!register)
}
