/// Manifest reader
///
/// A manifest is a text file with one serialized record per line. Lines are
/// read lazily, one at a time, as raw bytes so that a single line with bad
/// encoding only costs that record.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::error::DatasetError;

/// One manifest line with its zero-based position. Trailing `\n`/`\r` are
/// already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub index: usize,
    pub bytes: Vec<u8>,
}

impl RawLine {
    /// Lossy text form, for log messages.
    pub fn display_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

pub struct ManifestReader<R> {
    reader: R,
    path: PathBuf,
    next_index: usize,
    done: bool,
}

impl ManifestReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|e| {
            DatasetError::from_open(path.to_path_buf(), e, DatasetError::ManifestNotFound)
        })?;
        debug!("Opened manifest {}", path.display());
        Ok(Self::from_reader(BufReader::new(file), path))
    }
}

impl<R: BufRead> ManifestReader<R> {
    /// `path` is only used in error messages.
    pub fn from_reader(reader: R, path: &Path) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            next_index: 0,
            done: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines handed out so far
    pub fn lines_read(&self) -> usize {
        self.next_index
    }
}

impl<R: BufRead> Iterator for ManifestReader<R> {
    type Item = Result<RawLine, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut bytes = Vec::new();
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                while matches!(bytes.last(), Some(b'\n' | b'\r')) {
                    bytes.pop();
                }
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok(RawLine { index, bytes }))
            }
            Err(source) => {
                // a read error leaves the stream position undefined
                self.done = true;
                Some(Err(DatasetError::Io {
                    path: self.path.clone(),
                    source,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(content: &[u8]) -> Vec<RawLine> {
        ManifestReader::from_reader(Cursor::new(content.to_vec()), Path::new("test.txt"))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_lines_are_trimmed_and_indexed() {
        let lines = read_all(b"first\r\nsecond\n\nfourth");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].bytes, b"first");
        assert_eq!(lines[1].bytes, b"second");
        assert_eq!(lines[2].bytes, b"");
        assert_eq!(lines[3].index, 3);
        assert_eq!(lines[3].bytes, b"fourth");
    }

    #[test]
    fn test_trailing_newline_does_not_add_a_line() {
        let lines = read_all(b"a\nb\n");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_kept_as_bytes() {
        let lines = read_all(b"ok\n\xff\xfe\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].bytes, vec![0xff, 0xfe]);
        assert_eq!(lines[1].display_text(), "\u{fffd}\u{fffd}");
    }

    /// Hands out `data` on the first read, then fails.
    struct BrokenPipe {
        data: Option<&'static [u8]>,
    }

    impl std::io::Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                None => Err(std::io::Error::new(std::io::ErrorKind::Other, "device gone")),
            }
        }
    }

    #[test]
    fn test_read_error_ends_iteration() {
        let pipe = BrokenPipe { data: Some(&b"first\n"[..]) };
        let mut reader = ManifestReader::from_reader(BufReader::new(pipe), Path::new("train.txt"));

        assert_eq!(reader.next().unwrap().unwrap().bytes, b"first");
        match reader.next() {
            Some(Err(DatasetError::Io { path, .. })) => assert_eq!(path, Path::new("train.txt")),
            other => panic!("expected an I/O error, got {:?}", other),
        }
        assert!(reader.next().is_none());
        assert_eq!(reader.lines_read(), 1);
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = ManifestReader::open(&dir.path().join("train.txt")).err().unwrap();
        assert!(matches!(err, DatasetError::ManifestNotFound(_)));
    }
}
