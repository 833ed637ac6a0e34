//! Parser and builder for Nintendo DS NARC archives
//!
//! This crate provides symmetric (parser and builder) implementations for
//! the NARC container format (a file allocation table, a recursive
//! filename table and a raw payload packed into one buffer) plus a
//! store-mode ZIP writer for exporting archive contents.
//!
//! # Supported Formats
//!
//! - **NARC**: the archive container (`BTAF`/`BTNF`/`GMIF` blocks)
//! - **Filename table**: the recursive folder/file name tree with its
//!   folder-ID slot layout
//! - **ZIP (store)**: minimal uncompressed archives for export
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every format both parses and builds
//! - **Round-Trip Guarantee**: file bytes, names and ID mappings survive
//!   `parse(build(archive))` unchanged
//! - **Pure Transforms**: whole in-memory buffers in, whole buffers out;
//!   no module-level state, nothing shared across calls
//!
//! # Example
//!
//! ```rust
//! use narc_formats::Narc;
//!
//! let mut narc = Narc::new();
//! narc.add_file(vec![1, 2, 3], Some("a.bin"));
//! let bytes = narc.build()?;
//!
//! let parsed = Narc::parse(&bytes)?;
//! assert_eq!(parsed.file("a.bin"), Some(&[1, 2, 3][..]));
//! assert_eq!(parsed.id_of("a.bin"), Some(0));
//! # Ok::<(), narc_formats::NarcError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format fields
#![allow(clippy::cast_lossless)] // Sometimes clearer than From

pub mod cursor;
pub mod fnt;
pub mod narc;
pub mod zip;

pub use cursor::{ByteReader, ByteWriter, OutOfRange};
pub use fnt::{FntError, NameTable};
pub use narc::{Endian, FileRef, Narc, NarcError};
pub use zip::{ZipEntry, build_store_archive};
