//! Binary persistence for retrieved series.
//!
//! A compact little-endian container holding the sample rate, the channel
//! metadata, and the row-major signal matrix. Written when a retrieval is
//! configured with an output target; [`read_series`] loads it back for
//! downstream analysis.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::types::RetrievedSeries;

const SERIES_MAGIC_NUMBER: u32 = 0x69454547;
const SERIES_FORMAT_VERSION: u16 = 1;

/// Writes a series to `path`, overwriting any existing file.
///
/// Layout: magic number, format version, sample rate, channel count,
/// sample count, then per-channel `(id, name)` records and the row-major
/// `f64` data block.
pub fn write_series<P: AsRef<Path>>(path: P, series: &RetrievedSeries) -> io::Result<()> {
    if series.channel_ids.len() != series.num_channels()
        || series.channel_names.len() != series.num_channels()
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "channel metadata does not match the data matrix",
        ));
    }

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::with_capacity(65536, file);

    writer.write_u32::<LittleEndian>(SERIES_MAGIC_NUMBER)?;
    writer.write_u16::<LittleEndian>(SERIES_FORMAT_VERSION)?;
    writer.write_f64::<LittleEndian>(series.sample_rate)?;
    writer.write_u32::<LittleEndian>(series.num_channels() as u32)?;
    writer.write_u64::<LittleEndian>(series.num_samples() as u64)?;

    for (&id, name) in series.channel_ids.iter().zip(&series.channel_names) {
        writer.write_u32::<LittleEndian>(id as u32)?;
        write_string(&mut writer, name)?;
    }

    for row in series.data.rows() {
        for &value in row {
            writer.write_f64::<LittleEndian>(value)?;
        }
    }

    writer.flush()
}

/// Reads a series previously written by [`write_series`].
pub fn read_series<P: AsRef<Path>>(path: P) -> io::Result<RetrievedSeries> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::with_capacity(65536, file);

    let magic = reader.read_u32::<LittleEndian>()?;
    if magic != SERIES_MAGIC_NUMBER {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "unrecognized series file format",
        ));
    }
    let version = reader.read_u16::<LittleEndian>()?;
    if version != SERIES_FORMAT_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported series format version {}", version),
        ));
    }

    let sample_rate = reader.read_f64::<LittleEndian>()?;
    let num_channels = reader.read_u32::<LittleEndian>()? as usize;
    let num_samples = reader.read_u64::<LittleEndian>()? as usize;

    let mut channel_ids = Vec::with_capacity(num_channels);
    let mut channel_names = Vec::with_capacity(num_channels);
    for _ in 0..num_channels {
        channel_ids.push(reader.read_u32::<LittleEndian>()? as usize);
        channel_names.push(read_string(&mut reader)?);
    }

    let len = num_samples.checked_mul(num_channels).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "series dimensions overflow")
    })?;
    let mut values = vec![0.0; len];
    for value in values.iter_mut() {
        *value = reader.read_f64::<LittleEndian>()?;
    }
    let data = Array2::from_shape_vec((num_samples, num_channels), values)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

    Ok(RetrievedSeries {
        data,
        channel_ids,
        channel_names,
        sample_rate,
    })
}

/// Helper to write a length-prefixed UTF-8 string.
fn write_string<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "channel name too long",
        ));
    }
    writer.write_u16::<LittleEndian>(bytes.len() as u16)?;
    writer.write_all(bytes)
}

/// Helper to read a length-prefixed UTF-8 string.
fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = reader.read_u16::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "channel name is not valid UTF-8"))
}
