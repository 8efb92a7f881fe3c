//! Reading and writing Python source files in their declared encoding.
//!
//! The encoding of a file is taken from its byte order mark, then from a
//! `coding` declaration on one of its first two lines, and is UTF-8 otherwise.

use std::io;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::bytes::Regex;

static CODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\f]*#.*?coding[:=][ \t]*([-_.a-zA-Z0-9]+)").expect("valid regex")
});

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write `{path}`")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("`{path}` declares an unknown encoding {label:?}")]
    UnknownEncoding { path: Utf8PathBuf, label: String },
    #[error("`{path}` is not valid {encoding}")]
    Malformed { path: Utf8PathBuf, encoding: &'static str },
    #[error("`{path}` cannot be written as {encoding}")]
    Unencodable { path: Utf8PathBuf, encoding: &'static str },
}

/// The decoded text of a source file and how to write it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// The file contents with every line break turned into `\n`.
    pub text: String,
    pub encoding: &'static Encoding,
    pub bom: bool,
}

impl Source {
    pub fn read(path: &Utf8Path) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path)
            .map_err(|source| SourceError::Read { path: path.to_owned(), source })?;
        Self::decode(path, &bytes)
    }

    pub fn decode(path: &Utf8Path, bytes: &[u8]) -> Result<Self, SourceError> {
        let (encoding, bom, body) = match Encoding::for_bom(bytes) {
            Some((encoding, len)) => (encoding, true, &bytes[len..]),
            None => (declared_encoding(path, bytes)?.unwrap_or(UTF_8), false, bytes),
        };

        let (text, had_errors) = encoding.decode_without_bom_handling(body);
        if had_errors {
            return Err(SourceError::Malformed { path: path.to_owned(), encoding: encoding.name() });
        }
        tracing::trace!(%path, encoding = encoding.name(), bom, "decoded");
        Ok(Self { text: regularize_nls(&text), encoding, bom })
    }

    /// Encodes `text` the way this file was read, byte order mark included.
    pub fn encode(&self, path: &Utf8Path, text: &str) -> Result<Vec<u8>, SourceError> {
        let mut bytes = Vec::with_capacity(text.len() + 3);
        if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
            // encoding_rs only encodes into UTF-8 for these
            if self.bom {
                bytes.extend_from_slice(&utf16_unit(self.encoding, 0xFEFF));
            }
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&utf16_unit(self.encoding, unit));
            }
            return Ok(bytes);
        }

        if self.bom {
            bytes.extend_from_slice(b"\xEF\xBB\xBF");
        }
        let (encoded, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(SourceError::Unencodable {
                path: path.to_owned(),
                encoding: self.encoding.name(),
            });
        }
        bytes.extend_from_slice(&encoded);
        Ok(bytes)
    }

    pub fn write(&self, path: &Utf8Path, text: &str) -> Result<(), SourceError> {
        let bytes = self.encode(path, text)?;
        std::fs::write(path, bytes)
            .map_err(|source| SourceError::Write { path: path.to_owned(), source })
    }
}

fn utf16_unit(encoding: &'static Encoding, unit: u16) -> [u8; 2] {
    if encoding == UTF_16LE { unit.to_le_bytes() } else { unit.to_be_bytes() }
}

/// The encoding named by a `coding` declaration on the first two lines.
fn declared_encoding(
    path: &Utf8Path,
    bytes: &[u8],
) -> Result<Option<&'static Encoding>, SourceError> {
    let Some(label) = bytes.split(|&b| b == b'\n').take(2).find_map(|line| {
        let captures = CODING.captures(line)?;
        Some(String::from_utf8_lossy(&captures[1]).to_ascii_lowercase())
    }) else {
        return Ok(None);
    };

    match encoding_for_label(&label) {
        Some(encoding) => Ok(Some(encoding)),
        None => Err(SourceError::UnknownEncoding { path: path.to_owned(), label }),
    }
}

/// Maps a Python codec name onto an `encoding_rs` encoding.
fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.replace('_', "-");
    let label = match label.as_str() {
        "utf-8-sig" | "utf8-sig" => "utf-8",
        "latin-1" | "iso-latin-1" | "l1" => "latin1",
        "cp1252" => "windows-1252",
        "cp1251" => "windows-1251",
        "sjis" | "shift-jis" => "shift_jis",
        other => other,
    };
    Encoding::for_label(label.as_bytes())
}

/// Turns `\r\n` and lone `\r` line breaks into `\n`.
pub fn regularize_nls(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use encoding_rs::WINDOWS_1252;

    use super::*;

    fn decode(bytes: &[u8]) -> Result<Source, SourceError> {
        Source::decode(Utf8Path::new("t.py"), bytes)
    }

    #[test]
    fn plain_files_are_utf8() {
        let source = decode("π = 3.14\r\n".as_bytes()).unwrap();
        assert_eq!(source.text, "π = 3.14\n");
        assert_eq!(source.encoding, UTF_8);
        assert!(!source.bom);
    }

    #[test]
    fn byte_order_marks_win() {
        let source = decode(b"\xEF\xBB\xBF# coding: latin-1\nx = 1\n").unwrap();
        assert_eq!(source.encoding, UTF_8);
        assert!(source.bom);
        assert_eq!(source.text, "# coding: latin-1\nx = 1\n");

        let source = decode(b"\xFF\xFEx\x00\n\x00").unwrap();
        assert_eq!(source.encoding, UTF_16LE);
        assert_eq!(source.text, "x\n");
    }

    #[test]
    fn coding_declarations() {
        let source = decode(b"#!/usr/bin/env python\n# -*- coding: latin-1 -*-\ns = '\xe9'\n")
            .unwrap();
        assert_eq!(source.encoding, WINDOWS_1252);
        assert_eq!(source.text.lines().last(), Some("s = 'é'"));

        // Only the first two lines count.
        let source = decode(b"\n\n# coding: latin-1\n").unwrap();
        assert_eq!(source.encoding, UTF_8);

        let error = decode(b"# vim: set fileencoding=klingon :\n").unwrap_err();
        assert_eq!(error.to_string(), "`t.py` declares an unknown encoding \"klingon\"");
    }

    #[test]
    fn malformed_text_is_an_error() {
        let error = decode(b"s = '\xff'\n").unwrap_err();
        assert_eq!(error.to_string(), "`t.py` is not valid UTF-8");
    }

    #[test]
    fn text_is_encoded_back_as_it_was_read() {
        let path = Utf8Path::new("t.py");
        for bytes in [
            &b"# coding: latin-1\ns = '\xe9'\n"[..],
            b"\xEF\xBB\xBFx = 1\n",
            b"\xFE\xFF\x00x\x00\n",
        ] {
            let source = decode(bytes).unwrap();
            assert_eq!(source.encode(path, &source.text).unwrap(), bytes);
        }

        let source = decode(b"# coding: latin-1\n").unwrap();
        assert!(matches!(
            source.encode(path, "s = '\u{263a}'\n"),
            Err(SourceError::Unencodable { .. })
        ));
    }

    #[test]
    fn line_breaks_are_regularized() {
        assert_eq!(regularize_nls("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(regularize_nls("\r\r\n"), "\n\n");
    }
}
