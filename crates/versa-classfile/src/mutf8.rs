//! Modified UTF-8 (JVMS §4.4.7): `U+0000` is encoded as two bytes and
//! supplementary characters as two three-byte surrogates.

use crate::error::{Error, Result};

pub(crate) fn decode(bytes: &[u8]) -> Result<String> {
    if bytes.iter().all(|&b| (0x01..0x80).contains(&b)) {
        return std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidModifiedUtf8);
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        let continuation = |offset: usize| -> Result<u16> {
            match bytes.get(i + offset) {
                Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
                _ => Err(Error::InvalidModifiedUtf8),
            }
        };
        if b0 != 0 && b0 < 0x80 {
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            units.push(((b0 & 0x1F) << 6) | continuation(1)?);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            units.push(((b0 & 0x0F) << 12) | (continuation(1)? << 6) | continuation(2)?);
            i += 3;
        } else {
            return Err(Error::InvalidModifiedUtf8);
        }
    }
    String::from_utf16(&units).map_err(|_| Error::InvalidModifiedUtf8)
}

pub(crate) fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
