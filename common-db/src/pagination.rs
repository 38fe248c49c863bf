//! Page window for list queries.

/// Zero-based page window.
///
/// `offset = index * size`. A non-positive `size` means "no limit"; the
/// offset is still `index * size`, and a non-positive offset is simply not
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    index: i64,
    size: i64,
}

impl Page {
    pub fn new(index: i64, size: i64) -> Self {
        Self { index, size }
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    /// Calculate SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        self.index.saturating_mul(self.size)
    }

    /// SQL LIMIT value, `None` when unlimited.
    pub fn limit(&self) -> Option<i64> {
        (self.size > 0).then_some(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn offset_calculation() {
        assert_eq!(Page::new(0, 10).offset(), 0);
        assert_eq!(Page::new(1, 10).offset(), 10);
        assert_eq!(Page::new(2, 25).offset(), 50);
    }

    #[test]
    fn non_positive_size_is_unlimited() {
        assert_eq!(Page::new(3, 0).limit(), None);
        assert_eq!(Page::new(3, 0).offset(), 0);
        assert_eq!(Page::new(3, -1).limit(), None);
        assert_eq!(Page::new(3, -1).offset(), -3);
    }

    proptest! {
        /// Property: offset is page * limit, limit only when positive
        #[test]
        fn prop_window(index in 0i64..100_000, size in -100i64..1_000) {
            let page = Page::new(index, size);
            prop_assert_eq!(page.offset(), index * size);
            if size > 0 {
                prop_assert_eq!(page.limit(), Some(size));
            } else {
                prop_assert_eq!(page.limit(), None);
            }
        }
    }
}
