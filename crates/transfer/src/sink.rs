use std::io::Write;
use std::path::Path;

use crate::TransferError;

/// Receives downloaded segments in index order.
pub trait ContentSink: Send {
    /// Stores segment `index` (1-based). Segments arrive strictly in order.
    fn write_segment(&mut self, index: u32, data: &[u8]) -> Result<(), TransferError>;

    /// Called once after the last segment.
    fn finish(&mut self) -> Result<(), TransferError> {
        Ok(())
    }
}

fn check_order(expected: u32, got: u32) -> Result<(), TransferError> {
    if got != expected {
        return Err(TransferError::OutOfOrder { expected, got });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// BufferSink
// ---------------------------------------------------------------------------

/// Collects segments into memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    data: Vec<u8>,
    next: u32,
}

impl BufferSink {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            next: 1,
        }
    }

    pub fn segments_written(&self) -> u32 {
        self.next.saturating_sub(1)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ContentSink for BufferSink {
    fn write_segment(&mut self, index: u32, data: &[u8]) -> Result<(), TransferError> {
        check_order(self.next.max(1), index)?;
        self.data.extend_from_slice(data);
        self.next = index + 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileSink
// ---------------------------------------------------------------------------

/// Appends segments to a file, creating parent directories as needed.
pub struct FileSink {
    file: std::io::BufWriter<std::fs::File>,
    next: u32,
    written: u64,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path) -> Result<Self, TransferError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        Ok(Self {
            file: std::io::BufWriter::new(file),
            next: 1,
            written: 0,
        })
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl ContentSink for FileSink {
    fn write_segment(&mut self, index: u32, data: &[u8]) -> Result<(), TransferError> {
        check_order(self.next, index)?;
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        self.next = index + 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TransferError> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn buffer_sink_appends_in_order() {
        let mut sink = BufferSink::new();
        sink.write_segment(1, b"Hello").unwrap();
        sink.write_segment(2, b" World").unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.segments_written(), 2);
        assert_eq!(sink.into_inner(), b"Hello World");
    }

    #[test]
    fn buffer_sink_rejects_gap() {
        let mut sink = BufferSink::new();
        sink.write_segment(1, b"a").unwrap();
        let err = sink.write_segment(3, b"c").unwrap_err();
        assert!(matches!(err, TransferError::OutOfOrder { expected: 2, got: 3 }));
    }

    #[test]
    fn default_buffer_sink_starts_at_one() {
        let mut sink = BufferSink::default();
        assert!(sink.write_segment(2, b"x").is_err());
        sink.write_segment(1, b"x").unwrap();
    }

    #[test]
    fn file_sink_writes_and_creates_subdirectories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("statements/2024/sta.txt");
        let mut sink = FileSink::create(&path).unwrap();
        sink.write_segment(1, b"line1\n").unwrap();
        sink.write_segment(2, b"line2\n").unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.written(), 12);

        let content = std::fs::read(&path).unwrap();
        assert_eq!(&content, b"line1\nline2\n");
    }

    #[test]
    fn file_sink_rejects_replayed_segment() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileSink::create(&dir.path().join("out.bin")).unwrap();
        sink.write_segment(1, b"a").unwrap();
        assert!(matches!(
            sink.write_segment(1, b"a"),
            Err(TransferError::OutOfOrder { expected: 2, got: 1 })
        ));
    }
}
