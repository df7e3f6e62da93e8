use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::TransferError;
use crate::segment::SegmentPlan;

/// Supplies order data segment by segment.
///
/// Indexes are 1-based. Reading the same index twice within one transfer
/// must yield identical bytes.
pub trait ContentSource: Send {
    /// Total payload length in bytes.
    fn total_size(&self) -> u64;

    /// Number of segments the payload is cut into (at least 1).
    fn segment_count(&self) -> u32;

    /// Reads the bytes of segment `index`.
    fn read_segment(&mut self, index: u32) -> Result<Vec<u8>, TransferError>;

    /// SHA-256 over the whole payload, fed segment by segment.
    fn digest(&mut self) -> Result<[u8; 32], TransferError> {
        let mut hasher = Sha256::new();
        for index in 1..=self.segment_count() {
            hasher.update(self.read_segment(index)?);
        }
        Ok(hasher.finalize().into())
    }
}

// ---------------------------------------------------------------------------
// BufferSource
// ---------------------------------------------------------------------------

/// In-memory payload.
#[derive(Debug, Clone)]
pub struct BufferSource {
    data: Vec<u8>,
    plan: SegmentPlan,
}

impl BufferSource {
    pub fn new(data: impl Into<Vec<u8>>, segment_size: usize) -> Result<Self, TransferError> {
        let data = data.into();
        let plan = SegmentPlan::new(data.len() as u64, segment_size)?;
        Ok(Self { data, plan })
    }

    pub fn plan(&self) -> &SegmentPlan {
        &self.plan
    }
}

impl ContentSource for BufferSource {
    fn total_size(&self) -> u64 {
        self.plan.total_size()
    }

    fn segment_count(&self) -> u32 {
        self.plan.count()
    }

    fn read_segment(&mut self, index: u32) -> Result<Vec<u8>, TransferError> {
        let range = self.plan.range(index)?;
        Ok(self.data[range.start as usize..range.end as usize].to_vec())
    }

    fn digest(&mut self) -> Result<[u8; 32], TransferError> {
        Ok(Sha256::digest(&self.data).into())
    }
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// File-backed payload; segments are read by seeking to their offset.
pub struct FileSource {
    file: std::fs::File,
    plan: SegmentPlan,
}

impl FileSource {
    /// Opens `path`; its current length fixes the segmentation.
    pub fn open(path: &Path, segment_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let total_size = file.metadata()?.len();
        let plan = SegmentPlan::new(total_size, segment_size)?;
        Ok(Self { file, plan })
    }
}

impl ContentSource for FileSource {
    fn total_size(&self) -> u64 {
        self.plan.total_size()
    }

    fn segment_count(&self) -> u32 {
        self.plan.count()
    }

    fn read_segment(&mut self, index: u32) -> Result<Vec<u8>, TransferError> {
        let range = self.plan.range(index)?;

        // A file that shrank under us would produce a different segment.
        let actual = self.file.metadata()?.len();
        if actual != self.plan.total_size() {
            return Err(TransferError::SizeChanged {
                expected: self.plan.total_size(),
                actual,
            });
        }

        let mut buf = vec![0u8; (range.end - range.start) as usize];
        self.file.seek(SeekFrom::Start(range.start))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn buffer_source_reads_all() {
        let mut source = BufferSource::new(b"AABBCCDDEE".to_vec(), 4).unwrap();
        assert_eq!(source.total_size(), 10);
        assert_eq!(source.segment_count(), 3);
        assert_eq!(source.read_segment(1).unwrap(), b"AABB");
        assert_eq!(source.read_segment(2).unwrap(), b"CCDD");
        assert_eq!(source.read_segment(3).unwrap(), b"EE");
        assert!(source.read_segment(4).is_err());
    }

    #[test]
    fn buffer_source_rereads_identically() {
        let mut source = BufferSource::new(b"0123456789".to_vec(), 3).unwrap();
        let first = source.read_segment(2).unwrap();
        let again = source.read_segment(2).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn empty_buffer_has_one_empty_segment() {
        let mut source = BufferSource::new(Vec::new(), 1024).unwrap();
        assert_eq!(source.segment_count(), 1);
        assert!(source.read_segment(1).unwrap().is_empty());
    }

    #[test]
    fn reassembly_reproduces_payload() {
        let payload: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let mut source = BufferSource::new(payload.clone(), 1024).unwrap();
        let mut out = Vec::new();
        for i in 1..=source.segment_count() {
            out.extend(source.read_segment(i).unwrap());
        }
        assert_eq!(out, payload);
    }

    #[test]
    fn file_source_matches_buffer_source() {
        let dir = TempDir::new().unwrap();
        let data = b"The quick brown fox jumps over the lazy dog";
        let path = create_test_file(dir.path(), "order.bin", data);

        let mut file_src = FileSource::open(&path, 10).unwrap();
        let mut buf_src = BufferSource::new(data.to_vec(), 10).unwrap();
        assert_eq!(file_src.segment_count(), buf_src.segment_count());

        // Read out of order to exercise seeking.
        for i in (1..=file_src.segment_count()).rev() {
            assert_eq!(
                file_src.read_segment(i).unwrap(),
                buf_src.read_segment(i).unwrap()
            );
        }
    }

    #[test]
    fn file_source_detects_shrunk_file() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "order.bin", b"0123456789");
        let mut source = FileSource::open(&path, 4).unwrap();
        std::fs::write(&path, b"0123").unwrap();
        assert!(matches!(
            source.read_segment(1),
            Err(TransferError::SizeChanged { expected: 10, actual: 4 })
        ));
    }

    #[test]
    fn digest_matches_whole_payload_hash() {
        let dir = TempDir::new().unwrap();
        let data = b"segmented digest input";
        let path = create_test_file(dir.path(), "d.bin", data);

        let mut file_src = FileSource::open(&path, 5).unwrap();
        let mut buf_src = BufferSource::new(data.to_vec(), 5).unwrap();
        let expected: [u8; 32] = Sha256::digest(data).into();
        assert_eq!(file_src.digest().unwrap(), expected);
        assert_eq!(buf_src.digest().unwrap(), expected);
    }
}
