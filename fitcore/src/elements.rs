use crate::utils::*;

impl Region {
    /// The id is provisional: [`Allocator::new`] stamps the final one
    /// according to the region's position.
    pub fn new(label: i64, start: ByteSteps, end: ByteSteps) -> Self {
        Self {
            id: 0,
            label,
            start,
            end,
        }
    }

    /// Saturates at zero for inverted regions, which never make it
    /// past [`Allocator::new`] anyway.
    #[inline]
    pub fn capacity(&self) -> ByteSteps {
        self.end.saturating_sub(self.start)
    }

    /// Translates an offset relative to the region into an absolute address.
    #[inline]
    pub fn address_of(&self, offset: ByteSteps) -> ByteSteps {
        self.start + offset
    }
}

impl Process {
    pub fn new(id: ProcessId, size: ByteSteps) -> Self {
        Self { id, size }
    }

    /// Returns `true` if `free` bytes are enough to hold the process.
    /// An exact match counts as a fit.
    #[inline]
    pub fn fits_in(&self, free: ByteSteps) -> bool {
        self.size <= free
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_end_exclusive() {
        let r = Region::new(7, 10, 15);
        assert_eq!(r.capacity(), 5);
        assert_eq!(r.address_of(0), 10);
        assert_eq!(r.address_of(4), 14);
    }

    #[test]
    fn inverted_region_has_no_capacity() {
        assert_eq!(Region::new(0, 9, 3).capacity(), 0);
    }

    #[test]
    fn exact_fit_counts() {
        let p = Process::new(1, 5);
        assert!(p.fits_in(5));
        assert!(p.fits_in(6));
        assert!(!p.fits_in(4));
    }
}
