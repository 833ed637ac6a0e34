//! NARC archive container codec.
//!
//! A NARC file is a 16-byte header followed by three blocks:
//!
//! ```text
//! [0x00] Header     "NARC", byte-order marker, version, total size,
//!                   header size (0x10), block count (3)
//! [0x10] BTAF       file allocation table: per-file (start, end) byte
//!                   ranges into the raw-data payload
//! [....] BTNF       filename table (see the fnt module), or an 8-byte
//!                   stub when the archive carries no names
//! [....] GMIF       raw payload; each file padded to 4 bytes
//! ```
//!
//! Decode trusts only the magic tags and the actual block layout; the
//! header's version, total-size, header-size and block-count fields are
//! skipped and re-derived on encode.
//!
//! # Byte-order marker
//!
//! The marker mapping is inverted relative to the conventional meaning of
//! the value and is preserved exactly: `0xFFFE` selects big-endian mode on
//! decode, anything else selects little-endian. Encode writes `0xFEFF`
//! (version `0x0001`) for big-endian archives and `0xFFFE` (version
//! `0x0100`) for little-endian ones. On-disk files produced by the wider
//! tool ecosystem depend on this mapping.

mod error;

use tracing::debug;

use crate::cursor::{ByteReader, ByteWriter};
use crate::fnt::NameTable;
pub use error::{NarcError, NarcResult};

/// Offset of the first block; also the value of the header-size field.
const HEADER_SIZE: usize = 0x10;

/// First field of the 8-byte stub written in place of a real filename
/// table when an archive carries no names.
const FNT_STUB_MARKER: u32 = 0x0400_0000;

/// Byte order recorded in an archive's header marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Little-endian marker mode (the common case).
    #[default]
    Little,
    /// Big-endian marker mode.
    Big,
}

/// A file argument: either a raw file ID or a path resolved through the
/// archive's name tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef<'a> {
    /// Dense 0-based file ID.
    Id(u32),
    /// `/`-separated path, e.g. `"sub/b.bin"`.
    Path(&'a str),
}

impl From<u32> for FileRef<'_> {
    fn from(id: u32) -> Self {
        FileRef::Id(id)
    }
}

impl<'a> From<&'a str> for FileRef<'a> {
    fn from(path: &'a str) -> Self {
        FileRef::Path(path)
    }
}

/// An in-memory NARC archive: ordered file payloads, the byte-order flag,
/// and optionally a name tree mapping paths to file IDs.
#[derive(Debug, Clone)]
pub struct Narc {
    /// File payloads; the index is the file ID.
    pub files: Vec<Vec<u8>>,
    /// Byte-order marker mode (see the module docs for the mapping).
    pub endian: Endian,
    /// Name tree, or `None` for a nameless (stub) archive.
    pub names: Option<NameTable>,
}

impl Default for Narc {
    fn default() -> Self {
        Self::new()
    }
}

impl Narc {
    /// Create an empty little-endian archive with an empty name tree.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            endian: Endian::Little,
            names: Some(NameTable::new()),
        }
    }

    /// Parse an archive from its raw bytes.
    pub fn parse(data: &[u8]) -> NarcResult<Self> {
        let mut r = ByteReader::new(data);

        expect_magic(&mut r, "NARC", b"NARC")?;
        let bom = r.read_u16le()?;
        // 0xFFFE selects big-endian mode; anything else is little-endian.
        let endian = if bom == 0xFFFE {
            Endian::Big
        } else {
            Endian::Little
        };
        // Version, total size, header size, block count: re-derived from
        // the actual block layout instead.
        r.skip(2 + 4 + 2 + 2);

        expect_magic(&mut r, "BTAF", b"BTAF")?;
        let fat_size = r.read_u32le()?;
        let file_count = r.read_u32le()? as usize;
        let mut ranges = Vec::with_capacity(file_count.min(r.remaining() / 8));
        for _ in 0..file_count {
            let start = r.read_u32le()?;
            let end = r.read_u32le()?;
            ranges.push((start, end));
        }

        let fnt_start = HEADER_SIZE + fat_size as usize;
        r.set_pos(fnt_start);
        expect_magic(&mut r, "BTNF", b"BTNF")?;
        let fnt_size = r.read_u32le()? as usize;
        let fnt_body = r.slice(fnt_size.saturating_sub(8))?;
        let names = if is_fnt_stub(fnt_body) {
            None
        } else {
            Some(NameTable::parse(fnt_body)?)
        };

        r.set_pos(fnt_start + fnt_size);
        expect_magic(&mut r, "GMIF", b"GMIF")?;
        r.skip(4); // block size
        let payload_start = r.pos();

        let mut files = Vec::with_capacity(ranges.len());
        for &(start, end) in &ranges {
            r.set_pos(payload_start + start as usize);
            files.push(r.slice(end.saturating_sub(start) as usize)?.to_vec());
        }

        debug!(
            files = files.len(),
            endian = ?endian,
            named = names.is_some(),
            "parsed NARC archive"
        );
        Ok(Self {
            files,
            endian,
            names,
        })
    }

    /// Serialize the archive to NARC bytes.
    ///
    /// When `names` is present and holds at least one file, the real
    /// filename table is written; otherwise the 8-byte stub takes its
    /// place and only file IDs survive.
    pub fn build(&self) -> NarcResult<Vec<u8>> {
        let mut img = ByteWriter::new();
        let mut fat_entries = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let start = img.len() as u32;
            img.put_bytes(file);
            let end = img.len() as u32;
            img.align(4, 0x00);
            fat_entries.push((start, end));
        }
        let img = img.into_bytes();

        let mut fat = ByteWriter::new();
        fat.put_ascii("BTAF");
        fat.put_u32le(0x0C + fat_entries.len() as u32 * 8);
        fat.put_u32le(fat_entries.len() as u32);
        for &(start, end) in &fat_entries {
            fat.put_u32le(start);
            fat.put_u32le(end);
        }
        let fat = fat.into_bytes();

        let mut fnt = ByteWriter::new();
        fnt.put_ascii("BTNF");
        fnt.put_u32le(0); // size, patched after alignment
        match &self.names {
            Some(table) if !table.is_empty() => fnt.put_bytes(&table.build()?),
            _ => {
                fnt.put_u32le(FNT_STUB_MARKER);
                fnt.put_u16le(0);
                fnt.put_u16le(self.files.len() as u16);
            }
        }
        fnt.align(4, 0xFF);
        let fnt_size = fnt.len() as u32;
        fnt.set_pos(4);
        fnt.put_u32le(fnt_size);
        let fnt = fnt.into_bytes();

        let total = (HEADER_SIZE + fat.len() + fnt.len() + 8 + img.len()) as u32;
        let mut w = ByteWriter::new();
        w.put_ascii("NARC");
        match self.endian {
            Endian::Big => {
                w.put_u16le(0xFEFF);
                w.put_u16le(0x0001);
            }
            Endian::Little => {
                w.put_u16le(0xFFFE);
                w.put_u16le(0x0100);
            }
        }
        w.put_u32le(total);
        w.put_u16le(HEADER_SIZE as u16);
        w.put_u16le(3);
        w.put_bytes(&fat);
        w.put_bytes(&fnt);
        w.put_ascii("GMIF");
        w.put_u32le(8 + img.len() as u32);
        w.put_bytes(&img);

        debug!(bytes = total, files = self.files.len(), "built NARC archive");
        Ok(w.into_bytes())
    }

    /// Number of files in the archive.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Resolve a file reference to an in-range file ID.
    ///
    /// Unknown paths, paths on a nameless archive, and IDs at or past
    /// [`Self::file_count`] all resolve to `None`.
    pub fn resolve(&self, file: FileRef<'_>) -> Option<u32> {
        let id = match file {
            FileRef::Id(id) => id,
            FileRef::Path(path) => self.names.as_ref()?.id_of(path)?,
        };
        ((id as usize) < self.files.len()).then_some(id)
    }

    /// Borrow a file's bytes by ID or path.
    pub fn file<'a>(&self, file: impl Into<FileRef<'a>>) -> Option<&[u8]> {
        let id = self.resolve(file.into())?;
        Some(self.files[id as usize].as_slice())
    }

    /// Replace a file's bytes by ID or path.
    ///
    /// Returns `false` (and changes nothing) when the reference does not
    /// resolve.
    pub fn set_file<'a>(&mut self, file: impl Into<FileRef<'a>>, data: Vec<u8>) -> bool {
        match self.resolve(file.into()) {
            Some(id) => {
                self.files[id as usize] = data;
                true
            }
            None => false,
        }
    }

    /// Append a file, optionally registering `name` in the root folder of
    /// the name tree (a nameless archive gains a tree on first use).
    ///
    /// Name-to-ID bookkeeping stays consistent only while the root
    /// folder's file range is the tail of the ID space, which holds for
    /// archives assembled through this method alone.
    pub fn add_file(&mut self, data: Vec<u8>, name: Option<&str>) {
        self.files.push(data);
        if let Some(name) = name {
            self.names
                .get_or_insert_with(NameTable::new)
                .add_file(NameTable::ROOT, name);
        }
    }

    /// Remove a file by ID or path, shifting every later file ID down by
    /// one. Returns `false` when the reference does not resolve.
    ///
    /// The name tree's `first_file_id` bookkeeping is NOT renumbered:
    /// after a removal, name lookups for files past the removed ID are
    /// unreliable until the caller rebuilds the tree.
    pub fn remove_file<'a>(&mut self, file: impl Into<FileRef<'a>>) -> bool {
        match self.resolve(file.into()) {
            Some(id) => {
                self.files.remove(id as usize);
                true
            }
            None => false,
        }
    }

    /// Resolve a path to its file ID through the name tree.
    pub fn id_of(&self, path: &str) -> Option<u32> {
        self.names.as_ref()?.id_of(path)
    }

    /// Resolve a file ID back to its full path through the name tree.
    pub fn path_of(&self, id: u32) -> Option<String> {
        self.names.as_ref()?.path_of(id)
    }

    /// Flatten the archive into `(path, bytes)` pairs in file-ID order,
    /// ready for export. Nameless archives flatten to nothing.
    pub fn named_files(&self) -> Vec<(String, &[u8])> {
        let Some(names) = self.names.as_ref() else {
            return Vec::new();
        };
        names
            .entries()
            .into_iter()
            .filter_map(|(id, path)| {
                self.files
                    .get(id as usize)
                    .map(|data| (path, data.as_slice()))
            })
            .collect()
    }
}

fn expect_magic(r: &mut ByteReader<'_>, block: &'static str, expected: &[u8; 4]) -> NarcResult<()> {
    let bytes = r.slice(4)?;
    r.skip(4);
    if bytes != expected {
        let mut found = [0u8; 4];
        found.copy_from_slice(bytes);
        return Err(NarcError::BadMagic { block, found });
    }
    Ok(())
}

fn is_fnt_stub(body: &[u8]) -> bool {
    let mut r = ByteReader::new(body);
    r.read_u32le() == Ok(FNT_STUB_MARKER)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Three files: IDs 0 and 1 at the root as a.bin and c.bin, ID 2 at
    /// sub/b.bin.
    fn sample_narc() -> Narc {
        let mut narc = Narc::new();
        narc.files = vec![vec![0xAA; 5], vec![0xBB; 3], vec![0xCC; 9]];
        let mut names = NameTable::new();
        names.add_file(NameTable::ROOT, "a.bin");
        names.add_file(NameTable::ROOT, "c.bin");
        let sub = names.add_folder(NameTable::ROOT, "sub");
        names.add_file(sub, "b.bin");
        names.folder_mut(sub).unwrap().first_file_id = 2;
        narc.names = Some(names);
        narc
    }

    #[test]
    fn round_trip_preserves_files_and_names() {
        let narc = sample_narc();
        let bytes = narc.build().unwrap();
        let parsed = Narc::parse(&bytes).unwrap();

        assert_eq!(parsed.files, narc.files);
        assert_eq!(parsed.names, narc.names);
        assert_eq!(parsed.id_of("sub/b.bin"), Some(2));
        assert_eq!(parsed.path_of(1).as_deref(), Some("c.bin"));
    }

    #[test]
    fn header_layout_little_endian() {
        let bytes = sample_narc().build().unwrap();
        assert_eq!(&bytes[0..4], b"NARC");
        assert_eq!(&bytes[4..6], &[0xFE, 0xFF]); // marker 0xFFFE as LE
        assert_eq!(&bytes[6..8], &[0x00, 0x01]); // version 0x0100 as LE
        assert_eq!(&bytes[12..14], &[0x10, 0x00]);
        assert_eq!(&bytes[14..16], &[0x03, 0x00]);
        // Declared total size matches the actual buffer.
        let mut r = ByteReader::new(&bytes);
        r.set_pos(8);
        assert_eq!(r.read_u32le().unwrap() as usize, bytes.len());
    }

    #[test]
    fn byte_order_marker_mapping_is_preserved() {
        // Little-endian archives carry marker 0xFFFE, which decodes as
        // big-endian mode; the inverted mapping is intentional.
        let little = sample_narc().build().unwrap();
        assert_eq!(Narc::parse(&little).unwrap().endian, Endian::Big);

        let mut big = sample_narc();
        big.endian = Endian::Big;
        let bytes = big.build().unwrap();
        assert_eq!(&bytes[4..6], &[0xFF, 0xFE]); // marker 0xFEFF as LE
        assert_eq!(&bytes[6..8], &[0x01, 0x00]); // version 0x0001 as LE
        assert_eq!(Narc::parse(&bytes).unwrap().endian, Endian::Little);
    }

    #[test]
    fn payload_is_padded_per_file() {
        let mut narc = Narc::new();
        narc.names = None;
        narc.files = vec![vec![1, 2, 3], vec![4]];
        let bytes = narc.build().unwrap();
        let parsed = Narc::parse(&bytes).unwrap();
        assert_eq!(parsed.files, narc.files);

        // BTAF entries record unpadded ranges at padded starts.
        let mut r = ByteReader::new(&bytes);
        r.set_pos(HEADER_SIZE + 12);
        assert_eq!((r.read_u32le().unwrap(), r.read_u32le().unwrap()), (0, 3));
        assert_eq!((r.read_u32le().unwrap(), r.read_u32le().unwrap()), (4, 5));
    }

    #[test]
    fn stub_archive_recovers_files_by_id() {
        let mut narc = Narc::new();
        narc.names = None;
        narc.files = vec![vec![1], vec![2, 2], vec![3, 3, 3]];
        let bytes = narc.build().unwrap();

        let parsed = Narc::parse(&bytes).unwrap();
        assert_eq!(parsed.names, None);
        assert_eq!(parsed.files, narc.files);
        assert_eq!(parsed.file(1u32), Some(&[2, 2][..]));
        assert_eq!(parsed.id_of("anything"), None);
    }

    #[test]
    fn empty_name_tree_builds_as_stub() {
        let mut narc = Narc::new();
        narc.files = vec![vec![9; 4]];
        // names is Some(empty tree): no names to keep.
        let parsed = Narc::parse(&narc.build().unwrap()).unwrap();
        assert_eq!(parsed.names, None);
        assert_eq!(parsed.files, narc.files);
    }

    #[test]
    fn fnt_block_is_ff_padded_and_self_sized() {
        let bytes = sample_narc().build().unwrap();
        let mut r = ByteReader::new(&bytes);
        r.set_pos(HEADER_SIZE + 4);
        let fat_size = r.read_u32le().unwrap() as usize;
        let fnt_start = HEADER_SIZE + fat_size;
        r.set_pos(fnt_start);
        assert_eq!(r.slice(4).unwrap(), b"BTNF");
        r.skip(4);
        let fnt_size = r.read_u32le().unwrap() as usize;
        assert_eq!(fnt_size % 4, 0);
        // Padding bytes, if any, are 0xFF.
        let block = &bytes[fnt_start..fnt_start + fnt_size];
        let body_end = block.iter().rposition(|&b| b != 0xFF).unwrap() + 1;
        assert!(fnt_size - body_end < 4);
        // The block is followed directly by GMIF.
        assert_eq!(&bytes[fnt_start + fnt_size..fnt_start + fnt_size + 4], b"GMIF");
    }

    #[test]
    fn bad_magic_names_the_block() {
        let mut bytes = sample_narc().build().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            Narc::parse(&bytes).unwrap_err(),
            NarcError::BadMagic { block: "NARC", .. }
        ));

        let mut bytes = sample_narc().build().unwrap();
        bytes[HEADER_SIZE] = b'X';
        assert!(matches!(
            Narc::parse(&bytes).unwrap_err(),
            NarcError::BadMagic { block: "BTAF", .. }
        ));
    }

    #[test]
    fn truncated_archive_is_an_error() {
        let bytes = sample_narc().build().unwrap();
        assert!(matches!(
            Narc::parse(&bytes[..bytes.len() - 4]).unwrap_err(),
            NarcError::Truncated(_)
        ));
    }

    #[test]
    fn file_operations_resolve_ids_and_paths() {
        let mut narc = sample_narc();

        assert_eq!(narc.resolve(FileRef::Path("sub/b.bin")), Some(2));
        assert_eq!(narc.resolve(FileRef::Id(7)), None);
        assert_eq!(narc.file("a.bin"), Some(&[0xAA; 5][..]));
        assert_eq!(narc.file(99u32), None);
        assert_eq!(narc.file("sub/missing"), None);

        assert!(narc.set_file("c.bin", vec![0xDD]));
        assert_eq!(narc.file(1u32), Some(&[0xDD][..]));
        assert!(!narc.set_file("missing", vec![]));

        assert!(narc.remove_file("a.bin"));
        assert_eq!(narc.file_count(), 2);
        assert!(!narc.remove_file(2u32));
    }

    #[test]
    fn add_file_registers_names_in_the_root() {
        let mut narc = Narc::new();
        narc.add_file(vec![1], Some("one.bin"));
        narc.add_file(vec![2, 2], Some("two.bin"));
        narc.add_file(vec![3; 3], None);

        assert_eq!(narc.file_count(), 3);
        assert_eq!(narc.id_of("two.bin"), Some(1));
        assert_eq!(narc.file("two.bin"), Some(&[2, 2][..]));
        // The unnamed file is reachable by ID only.
        assert_eq!(narc.file(2u32), Some(&[3; 3][..]));
        assert_eq!(narc.path_of(2), None);
    }

    #[test]
    fn named_files_flatten_for_export() {
        let narc = sample_narc();
        let flat = narc.named_files();
        assert_eq!(
            flat.iter().map(|(p, _)| p.as_str()).collect::<Vec<_>>(),
            ["a.bin", "c.bin", "sub/b.bin"]
        );
        assert_eq!(flat[2].1, &[0xCC; 9][..]);

        let mut nameless = sample_narc();
        nameless.names = None;
        assert!(nameless.named_files().is_empty());
    }
}
