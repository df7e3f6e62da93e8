use std::ops::Range;

use crate::TransferError;

/// Number of segments needed for `total_size` bytes at `segment_size` per segment.
///
/// An empty payload still occupies one (empty) segment. A size that is an
/// exact multiple of `segment_size` gets no trailing empty segment.
pub fn segment_count(total_size: u64, segment_size: usize) -> Result<u32, TransferError> {
    if segment_size == 0 {
        return Err(TransferError::InvalidSegmentSize(segment_size));
    }
    if total_size == 0 {
        return Ok(1);
    }
    let count = total_size.div_ceil(segment_size as u64);
    u32::try_from(count).map_err(|_| TransferError::TooManySegments(total_size))
}

/// Fixed segmentation of a payload of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    total_size: u64,
    segment_size: usize,
    count: u32,
}

impl SegmentPlan {
    pub fn new(total_size: u64, segment_size: usize) -> Result<Self, TransferError> {
        let count = segment_count(total_size, segment_size)?;
        Ok(Self {
            total_size,
            segment_size,
            count,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Byte range covered by the 1-based segment `index`.
    pub fn range(&self, index: u32) -> Result<Range<u64>, TransferError> {
        if index == 0 || index > self.count {
            return Err(TransferError::SegmentOutOfRange {
                index,
                count: self.count,
            });
        }
        let start = u64::from(index - 1) * self.segment_size as u64;
        let end = (start + self.segment_size as u64).min(self.total_size);
        Ok(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_rounds_up() {
        assert_eq!(segment_count(2500, 1024).unwrap(), 3);
        assert_eq!(segment_count(1, 1024).unwrap(), 1);
        assert_eq!(segment_count(1025, 1024).unwrap(), 2);
    }

    #[test]
    fn empty_payload_is_one_segment() {
        assert_eq!(segment_count(0, 1024).unwrap(), 1);
        let plan = SegmentPlan::new(0, 1024).unwrap();
        assert_eq!(plan.range(1).unwrap(), 0..0);
        assert_eq!(plan.count(), 1);
    }

    #[test]
    fn exact_multiple_has_no_trailing_segment() {
        assert_eq!(segment_count(3 * 1024, 1024).unwrap(), 3);
        let plan = SegmentPlan::new(3 * 1024, 1024).unwrap();
        assert_eq!(plan.range(3).unwrap(), 2048..3072);
        assert!(plan.range(4).is_err());
    }

    #[test]
    fn zero_segment_size_rejected() {
        assert!(matches!(
            segment_count(10, 0),
            Err(TransferError::InvalidSegmentSize(0))
        ));
    }

    #[test]
    fn ranges_cover_payload_once() {
        let plan = SegmentPlan::new(2500, 1024).unwrap();
        let sizes: Vec<u64> = (1..=plan.count())
            .map(|i| {
                let r = plan.range(i).unwrap();
                r.end - r.start
            })
            .collect();
        assert_eq!(sizes, vec![1024, 1024, 452]);
    }

    #[test]
    fn index_zero_out_of_range() {
        let plan = SegmentPlan::new(10, 4).unwrap();
        assert!(matches!(
            plan.range(0),
            Err(TransferError::SegmentOutOfRange { index: 0, count: 3 })
        ));
    }

    #[test]
    fn too_many_segments_rejected() {
        assert!(matches!(
            segment_count(u64::MAX, 1),
            Err(TransferError::TooManySegments(_))
        ));
    }
}
