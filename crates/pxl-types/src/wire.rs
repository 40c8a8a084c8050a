// Little-endian wire primitives shared by the asset/network codec.
//
// Every multi-byte integer in the stream is fixed-width little-endian so the
// encoding is bit-exact across platforms. Strings are length-prefixed UTF-8;
// a nullable string uses length -1 as the absent sentinel, which keeps
// "absent" and "empty" distinguishable on the wire.

use std::io::{self, Read, Write};

use anyhow::{Result, bail};

pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    write_u8(writer, value as u8)
}

pub fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    match read_u8(reader)? {
        0 => Ok(false),
        1 => Ok(true),
        other => bail!("Invalid boolean byte: {other:#04x}"),
    }
}

pub fn write_i32_le<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub fn read_i32_le<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    write_i32_le(writer, value.len() as i32)?;
    writer.write_all(value.as_bytes())
}

pub fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_i32_le(reader)?;
    if len < 0 {
        bail!("Negative string length: {len}");
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Absent encodes as length -1, so an empty string survives the round trip
/// as empty rather than collapsing into absent.
pub fn write_nullable_string<W: Write>(writer: &mut W, value: Option<&str>) -> io::Result<()> {
    match value {
        None => write_i32_le(writer, -1),
        Some(s) => write_string(writer, s),
    }
}

pub fn read_nullable_string<R: Read>(reader: &mut R) -> Result<Option<String>> {
    let len = read_i32_le(reader)?;
    if len == -1 {
        return Ok(None);
    }
    if len < 0 {
        bail!("Negative string length: {len}");
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(Some(String::from_utf8(buf)?))
}

/// Read a count prefix, rejecting negative values.
pub fn read_count<R: Read>(reader: &mut R) -> Result<usize> {
    let count = read_i32_le(reader)?;
    if count < 0 {
        bail!("Negative count: {count}");
    }
    Ok(count as usize)
}
