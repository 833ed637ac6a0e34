//! Store-mode ZIP writer.
//!
//! Packages a flat list of `(name, bytes)` entries into a standard ZIP
//! archive using the store method only: data is copied verbatim and only a
//! CRC-32 is computed. Timestamps are fixed at zero so output depends
//! solely on the input entries.
//!
//! Entry names are written as each char's low 8 bits; non-ASCII names are
//! truncated byte-wise. This matches what the rest of the ecosystem around
//! the archive tool produces and is a known limitation.

use tracing::debug;

use crate::cursor::ByteWriter;

/// One file to be packaged, usually a flattened archive path and its
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Entry name, `/`-separated for nested paths.
    pub name: String,
    /// Raw payload, stored uncompressed.
    pub data: Vec<u8>,
}

impl ZipEntry {
    /// Create an entry from any name and payload.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Build a store-mode ZIP archive from `entries`, in order.
pub fn build_store_archive(entries: &[ZipEntry]) -> Vec<u8> {
    let mut w = ByteWriter::new();
    let mut central = ByteWriter::new();

    for entry in entries {
        let name = encode_name(&entry.name);
        let crc = crc32fast::hash(&entry.data);
        let size = entry.data.len() as u32;
        let local_offset = w.len() as u32;

        w.put_bytes(b"PK\x03\x04"); // local file header
        w.put_u16le(20); // version needed
        w.put_u16le(0); // flags
        w.put_u16le(0); // method: store
        w.put_u16le(0); // mod time
        w.put_u16le(0); // mod date
        w.put_u32le(crc);
        w.put_u32le(size); // compressed
        w.put_u32le(size); // uncompressed
        w.put_u16le(name.len() as u16);
        w.put_u16le(0); // extra field length
        w.put_bytes(&name);
        w.put_bytes(&entry.data);

        central.put_bytes(b"PK\x01\x02"); // central directory record
        central.put_u16le(20); // version made by
        central.put_u16le(20); // version needed
        central.put_u16le(0); // flags
        central.put_u16le(0); // method
        central.put_u16le(0); // mod time
        central.put_u16le(0); // mod date
        central.put_u32le(crc);
        central.put_u32le(size);
        central.put_u32le(size);
        central.put_u16le(name.len() as u16);
        central.put_u16le(0); // extra field length
        central.put_u16le(0); // comment length
        central.put_u16le(0); // disk number start
        central.put_u16le(0); // internal attributes
        central.put_u32le(0); // external attributes
        central.put_u32le(local_offset);
        central.put_bytes(&name);
    }

    let central = central.into_bytes();
    let central_offset = w.len() as u32;
    w.put_bytes(&central);

    w.put_bytes(b"PK\x05\x06"); // end of central directory
    w.put_u16le(0); // disk number
    w.put_u16le(0); // disk with central directory
    w.put_u16le(entries.len() as u16);
    w.put_u16le(entries.len() as u16);
    w.put_u32le(central.len() as u32);
    w.put_u32le(central_offset);
    w.put_u16le(0); // comment length

    debug!(
        entries = entries.len(),
        bytes = w.len(),
        "built store archive"
    );
    w.into_bytes()
}

fn encode_name(name: &str) -> Vec<u8> {
    name.chars().map(|c| (c as u32 & 0xFF) as u8).collect()
}
