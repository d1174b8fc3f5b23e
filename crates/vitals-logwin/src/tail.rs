//! Bounded reads over append-only logs.
//!
//! Access logs on a busy server grow without limit, so the analyzer never
//! reads a whole file. Only the trailing segment (last `max_lines` lines)
//! is loaded, by walking the file backwards in fixed-size blocks.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use vitals_core::VitalsError;

const BLOCK_SIZE: u64 = 64 * 1024;

/// Read up to the last `max_lines` lines of the file at `path`.
///
/// Lines are returned oldest-first, without terminators. Memory use is
/// bounded by the size of the returned segment plus one block; the rest of
/// the file is never read.
///
/// # Errors
///
/// Returns [`VitalsError::FileNotFound`] if the file does not exist, or
/// [`VitalsError::Io`] if it cannot be read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use vitals_logwin::tail_lines;
///
/// let lines = tail_lines(Path::new("/var/log/nginx/access.log"), 50_000).unwrap();
/// println!("scanning {} lines", lines.len());
/// ```
pub fn tail_lines(path: &Path, max_lines: usize) -> Result<Vec<String>, VitalsError> {
    if max_lines == 0 {
        return Ok(Vec::new());
    }

    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VitalsError::FileNotFound(path.to_path_buf())
        } else {
            VitalsError::Io(e)
        }
    })?;

    let len = file.seek(SeekFrom::End(0))?;
    let mut pos = len;
    let mut buf: Vec<u8> = Vec::new();
    let mut newlines = 0usize;

    // Walk backwards one block at a time until enough line breaks are seen.
    // One extra break is needed to know where the oldest wanted line starts.
    while pos > 0 && newlines <= max_lines {
        let block_len = BLOCK_SIZE.min(pos);
        pos -= block_len;
        file.seek(SeekFrom::Start(pos))?;

        let mut block = vec![0u8; block_len as usize];
        file.read_exact(&mut block)?;
        newlines += block.iter().filter(|&&b| b == b'\n').count();

        block.extend_from_slice(&buf);
        buf = block;
    }

    let text = String::from_utf8_lossy(&buf);
    let mut lines: Vec<String> = text.lines().map(str::to_owned).collect();
    if lines.len() > max_lines {
        lines.drain(..lines.len() - max_lines);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(lines: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..lines {
            writeln!(file, "line {i}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn short_file_returns_everything() {
        let file = write_log(10);
        let lines = tail_lines(file.path(), 100).unwrap();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "line 0");
        assert_eq!(lines[9], "line 9");
    }

    #[test]
    fn long_file_is_truncated_to_trailing_segment() {
        let file = write_log(500);
        let lines = tail_lines(file.path(), 100).unwrap();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], "line 400");
        assert_eq!(lines[99], "line 499");
    }

    #[test]
    fn spans_multiple_blocks() {
        // Each line ~70 bytes; 3000 lines crosses the 64 KiB block boundary.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let pad = "x".repeat(60);
        for i in 0..3000 {
            writeln!(file, "entry {i} {pad}").unwrap();
        }
        file.flush().unwrap();

        let lines = tail_lines(file.path(), 2500).unwrap();
        assert_eq!(lines.len(), 2500);
        assert!(lines[0].starts_with("entry 500 "));
        assert!(lines[2499].starts_with("entry 2999 "));
    }

    #[test]
    fn empty_file_yields_no_lines() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(tail_lines(file.path(), 100).unwrap().is_empty());
    }

    #[test]
    fn zero_max_lines_reads_nothing() {
        let file = write_log(10);
        assert!(tail_lines(file.path(), 0).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = tail_lines(Path::new("/nonexistent/access.log"), 10).unwrap_err();
        assert!(matches!(err, VitalsError::FileNotFound(_)));
    }

    #[test]
    fn unterminated_last_line_is_kept() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first\nsecond").unwrap();
        file.flush().unwrap();
        let lines = tail_lines(file.path(), 10).unwrap();
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }
}
