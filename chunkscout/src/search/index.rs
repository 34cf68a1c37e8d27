use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanMetrics;

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Dense mapping from 0-based line number to the byte offset just past that line.
///
/// A line ends at `\n` or at end of file; a trailing fragment without a newline
/// is still a line, an empty file has none. Offsets are strictly increasing
/// because every line consumes at least one byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    ends: Vec<u64>,
}

impl LineIndex {
    /// Reads `path` once and records where every line ends
    pub fn build(path: &Path) -> SearchResult<Self> {
        Self::build_with_metrics(path, &ScanMetrics::new())
    }

    /// Same as [`LineIndex::build`], reporting into `metrics`
    pub fn build_with_metrics(path: &Path, metrics: &ScanMetrics) -> SearchResult<Self> {
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| SearchError::from_io(path, e))?
            .len();

        let mapped = size >= LARGE_FILE_THRESHOLD;
        let index = if mapped {
            Self::from_mmap(path, &file)?
        } else {
            Self::from_reader(path, file)?
        };

        metrics.record_index(index.total_lines() as u64, index.byte_len(), mapped);
        debug!(
            "Indexed {}: {} lines, {} bytes",
            path.display(),
            index.total_lines(),
            index.byte_len()
        );
        Ok(index)
    }

    fn from_reader(path: &Path, file: File) -> SearchResult<Self> {
        trace!("Using buffered indexing for: {}", path.display());

        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut line = Vec::with_capacity(256);
        let mut ends = Vec::new();
        let mut cursor = 0u64;

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| SearchError::from_io(path, e))?;
            if read == 0 {
                break;
            }
            cursor += read as u64;
            ends.push(cursor);
        }

        Ok(Self { ends })
    }

    fn from_mmap(path: &Path, file: &File) -> SearchResult<Self> {
        trace!("Using memory-mapped indexing for: {}", path.display());

        // SAFETY: the map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(file) }.map_err(|e| SearchError::from_io(path, e))?;
        Ok(Self::from_bytes(&mmap))
    }

    /// Indexes an in-memory buffer with the same line rules as a file
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut ends: Vec<u64> = bytes
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == b'\n')
            .map(|(pos, _)| pos as u64 + 1)
            .collect();

        let len = bytes.len() as u64;
        if ends.last().copied().unwrap_or(0) < len {
            ends.push(len);
        }

        Self { ends }
    }

    /// Number of lines in the file
    pub fn total_lines(&self) -> usize {
        self.ends.len()
    }

    /// Offset just past line `line`, if it exists
    pub fn line_end(&self, line: usize) -> Option<u64> {
        self.ends.get(line).copied()
    }

    /// Offset of the first byte of `line`: 0 for the first line, otherwise the end of
    /// the previous one. Asking for `total_lines()` yields the end of the file.
    pub fn line_start(&self, line: usize) -> Option<u64> {
        match line {
            0 => Some(0),
            n if n <= self.ends.len() => Some(self.ends[n - 1]),
            _ => None,
        }
    }

    /// Bytes covered by the index
    pub fn byte_len(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_index_terminated_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        fs::write(&path, "foo\nbar\nfoo\nbaz\nfoo\n").unwrap();

        let index = LineIndex::build(&path).unwrap();
        assert_eq!(index.total_lines(), 5);
        assert_eq!(index.line_end(0), Some(4));
        assert_eq!(index.line_end(4), Some(20));
        assert_eq!(index.line_end(5), None);
        assert_eq!(index.line_start(0), Some(0));
        assert_eq!(index.line_start(2), Some(8));
        assert_eq!(index.line_start(5), Some(20));
        assert_eq!(index.line_start(6), None);
    }

    #[test]
    fn test_index_unterminated_last_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tail.txt");
        fs::write(&path, "alpha\nbeta").unwrap();

        let index = LineIndex::build(&path).unwrap();
        assert_eq!(index.total_lines(), 2);
        assert_eq!(index.line_end(1), Some(10));
        assert_eq!(index.byte_len(), 10);
    }

    #[test]
    fn test_index_empty_file_and_blank_lines() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "").unwrap();
        let index = LineIndex::build(&empty).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.total_lines(), 0);
        assert_eq!(index.line_start(0), Some(0));

        let blanks = dir.path().join("blanks.txt");
        fs::write(&blanks, "\n\n\n").unwrap();
        let index = LineIndex::build(&blanks).unwrap();
        assert_eq!(index.total_lines(), 3);
        assert_eq!(index.line_end(2), Some(3));
    }

    #[test]
    fn test_offsets_strictly_increasing() {
        let content = "a\n\nbb\nccc\n\n\ndddd";
        let index = LineIndex::from_bytes(content.as_bytes());
        assert_eq!(index.total_lines(), 7);
        let ends: Vec<u64> = (0..index.total_lines())
            .map(|i| index.line_end(i).unwrap())
            .collect();
        assert!(ends.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_buffered_and_mapped_agree() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("same.txt");
        let content = "one\ntwo\n\nthree without newline";
        fs::write(&path, content).unwrap();

        let buffered = LineIndex::build(&path).unwrap();
        let mapped = LineIndex::from_bytes(content.as_bytes());
        assert_eq!(buffered, mapped);
    }

    #[test]
    fn test_large_file_uses_mmap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.txt");
        let line = "0123456789abcdef0123456789abcdef0123456789abcdef012345678\n";
        let repeats = (LARGE_FILE_THRESHOLD as usize / line.len()) + 1;
        fs::write(&path, line.repeat(repeats)).unwrap();

        let metrics = ScanMetrics::new();
        let index = LineIndex::build_with_metrics(&path, &metrics).unwrap();
        assert_eq!(index.total_lines(), repeats);

        let stats = metrics.get_stats();
        assert_eq!(stats.mmap_indexes, 1);
        assert_eq!(stats.buffered_indexes, 0);
        assert_eq!(stats.lines_indexed, repeats as u64);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = LineIndex::build(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, SearchError::FileNotFound(_)));
    }
}
