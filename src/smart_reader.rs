use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::{DeflateDecoder, MultiGzDecoder};

const MAX_LAYERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Gzip,
    Zip,
}

fn detect_layer(buf: &[u8]) -> Option<Layer> {
    match buf {
        [0x1f, 0x8b, ..] => Some(Layer::Gzip),
        [b'P', b'K', 0x03, 0x04, ..] => Some(Layer::Zip),
        _ => None,
    }
}

/// Opens a genotype or panel file, peeling off gzip/BGZF and zip layers.
///
/// Vendors commonly ship raw data as a zip archive holding one text file;
/// only the first archive entry is read.
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    decode(Box::new(BufReader::new(file)))
}

/// Same as [`open_input`] for an already-open stream.
pub fn decode(mut reader: Box<dyn BufRead + Send>) -> io::Result<Box<dyn BufRead + Send>> {
    for _ in 0..MAX_LAYERS {
        let layer = detect_layer(reader.fill_buf()?);
        reader = match layer {
            Some(Layer::Gzip) => {
                tracing::debug!("decoding gzip layer");
                Box::new(BufReader::new(MultiGzDecoder::new(reader)))
            }
            Some(Layer::Zip) => {
                tracing::debug!("decoding zip layer");
                Box::new(BufReader::new(first_zip_entry(reader)?))
            }
            None => break,
        };
    }
    Ok(reader)
}

/// Streams the first entry of a zip archive from its local file header.
fn first_zip_entry(mut reader: Box<dyn BufRead + Send>) -> io::Result<Box<dyn Read + Send>> {
    let mut header = [0u8; 30];
    reader.read_exact(&mut header)?;

    let le16 = |at: usize| u16::from_le_bytes([header[at], header[at + 1]]);
    let flags = le16(6);
    let method = le16(8);
    let compressed_size =
        u32::from_le_bytes([header[18], header[19], header[20], header[21]]) as u64;
    let skip = u64::from(le16(26)) + u64::from(le16(28));

    io::copy(&mut reader.by_ref().take(skip), &mut io::sink())?;

    match method {
        8 => Ok(Box::new(DeflateDecoder::new(reader))),
        0 if flags & 0x0008 != 0 => {
            tracing::warn!("stored zip entry without a size in its header; reading to end of file");
            Ok(Box::new(reader))
        }
        0 => Ok(Box::new(reader.take(compressed_size))),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported zip compression method {other}"),
        )),
    }
}
