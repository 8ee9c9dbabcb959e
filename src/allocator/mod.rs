//! Category-based identifier allocation
//!
//! Generated entities (matrices in particular) get sequential numeric codes
//! drawn from named categories. Each category reserves a contiguous half-open
//! range; the ranges are laid out back to back in ascending end-boundary
//! order, and one overflow range starts after the last boundary. A category
//! that runs out falls through to the overflow range instead of failing, so
//! exhaustion can never abort a build.

use once_cell::sync::Lazy;

/// Error during allocator use
#[derive(Debug, thiserror::Error)]
pub enum AllocatorError {
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    #[error("No category selected")]
    NoCategorySelected,
}

/// Matrix-number category boundaries of the demand model, keyed by category
/// name with the exclusive end of its number range.
static MATRIX_CATEGORY_BOUNDS: Lazy<Vec<(&'static str, i64)>> = Lazy::new(|| {
    vec![
        ("Visem_Demand", 20),
        ("Visem_OV_Stunden", 30),
        ("Other_Demand", 90),
        ("OV_Demand", 100),
        ("DestinationChoiceSkims", 110),
        ("IV_Skims", 150),
        ("IV_Skims_Parking", 200),
        ("OV_Skims_Fare", 250),
        ("OV_Skims_PJT", 700),
        ("Activities", 800),
        ("Activities_Homebased", 900),
        ("Activities_Balancing", 1000),
        ("Commuters", 1100),
        ("VL_Activities", 1200),
        ("VL_Activities_Homebased", 1300),
        ("VL_Activities_OBB", 1600),
        ("Activities_OBB", 1700),
        ("OV_TimeSeries_Skims_Formula", 1800),
        ("OV_TimeSeries_Skims", 2000),
        ("Demand_Pgr", 4000),
        ("Demand_Wiver", 4500),
        ("Demand_Wiver_OBB", 5000),
        ("OV_Demand_Activities", 5500),
        ("Modes_Demand_Activities", 6000),
        ("Demand_OV_Tagesgang", 6100),
        ("Demand_Verkehrsleistung", 7000),
        ("LogsumsPendler", 7500),
        ("Logsums", 9000),
        ("Accessibilities", 10000),
    ]
});

/// Forward-only cursor over a half-open number range
#[derive(Debug, Clone)]
struct RangeCursor {
    next: i64,
    end: i64,
}

impl RangeCursor {
    fn draw(&mut self) -> Option<i64> {
        if self.next >= self.end {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(id)
    }
}

/// Sequential identifier allocator with named, reserved sub-ranges
#[derive(Debug, Clone)]
pub struct CategoryAllocator {
    /// Categories with their cursors, sorted by range end
    ranges: Vec<(String, RangeCursor)>,
    overflow: RangeCursor,
    active: Option<usize>,
}

impl CategoryAllocator {
    /// Build an allocator from a category -> end-boundary mapping. Ranges
    /// are contiguous: each category starts where the previous one ends,
    /// the first at 1, and the overflow range after the last boundary.
    pub fn new<S: Into<String>>(boundaries: impl IntoIterator<Item = (S, i64)>) -> Self {
        let mut sorted: Vec<(String, i64)> = boundaries
            .into_iter()
            .map(|(name, end)| (name.into(), end))
            .collect();
        sorted.sort_by_key(|(_, end)| *end);

        let mut ranges = Vec::with_capacity(sorted.len());
        let mut start = 1;
        for (name, end) in sorted {
            ranges.push((name, RangeCursor { next: start, end }));
            start = end;
        }
        let overflow = RangeCursor {
            next: start,
            end: i64::MAX,
        };
        Self {
            ranges,
            overflow,
            active: None,
        }
    }

    /// Allocator preloaded with the demand model's matrix-number categories.
    pub fn matrix_defaults() -> Self {
        Self::new(MATRIX_CATEGORY_BOUNDS.iter().copied())
    }

    /// Select the active category. Pure state change, no allocation.
    pub fn select(&mut self, category: &str) -> Result<(), AllocatorError> {
        match self.ranges.iter().position(|(name, _)| name == category) {
            Some(pos) => {
                self.active = Some(pos);
                Ok(())
            }
            None => Err(AllocatorError::UnknownCategory(category.to_string())),
        }
    }

    /// Draw the next unused identifier from the active category, falling
    /// through to the overflow range when the category is exhausted.
    pub fn next_id(&mut self) -> Result<i64, AllocatorError> {
        let pos = self.active.ok_or(AllocatorError::NoCategorySelected)?;
        match self.ranges[pos].1.draw() {
            Some(id) => Ok(id),
            // exhaustion degrades to the overflow range, never an error
            None => Ok(self
                .overflow
                .draw()
                .expect("overflow range cannot be exhausted")),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|(name, _)| name.as_str())
    }

    /// Reserved `[start, end)` range of a category (start = next unused).
    pub fn remaining_range(&self, category: &str) -> Option<(i64, i64)> {
        self.ranges
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, cursor)| (cursor.next, cursor.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_are_contiguous() {
        let alloc = CategoryAllocator::new([("A", 5), ("B", 10)]);
        assert_eq!(alloc.remaining_range("A"), Some((1, 5)));
        assert_eq!(alloc.remaining_range("B"), Some((5, 10)));
        assert_eq!(alloc.remaining_range("C"), None);
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_end() {
        let alloc = CategoryAllocator::new([("B", 10), ("A", 5)]);
        assert_eq!(alloc.remaining_range("A"), Some((1, 5)));
        assert_eq!(alloc.remaining_range("B"), Some((5, 10)));
    }

    #[test]
    fn test_allocation_sequence_with_overflow() {
        let mut alloc = CategoryAllocator::new([("A", 5), ("B", 10)]);
        alloc.select("A").unwrap();
        assert_eq!(alloc.next_id().unwrap(), 1);
        assert_eq!(alloc.next_id().unwrap(), 2);
        assert_eq!(alloc.next_id().unwrap(), 3);
        assert_eq!(alloc.next_id().unwrap(), 4);
        // A's range [1, 5) holds four values; the fifth call overflows
        assert_eq!(alloc.next_id().unwrap(), 10);

        alloc.select("B").unwrap();
        for expected in 5..10 {
            assert_eq!(alloc.next_id().unwrap(), expected);
        }
        // B exhausted too; overflow continues strictly increasing
        assert_eq!(alloc.next_id().unwrap(), 11);
    }

    #[test]
    fn test_no_cross_category_collision() {
        let mut alloc = CategoryAllocator::new([("A", 5), ("B", 10), ("C", 12)]);
        let mut seen = std::collections::HashSet::new();
        for (category, draws) in [("A", 4), ("B", 5), ("C", 2)] {
            alloc.select(category).unwrap();
            for _ in 0..draws {
                assert!(seen.insert(alloc.next_id().unwrap()));
            }
        }
    }

    #[test]
    fn overflow_cursor_is_shared_across_categories() {
        // Ordering hazard: overflow ids are drawn from one shared cursor,
        // interleaved in whatever order categories happen to exhaust, so an
        // overflow id a later exhausted category would have drawn first can
        // already be gone. Reserved, unexhausted ranges are never touched.
        let mut alloc = CategoryAllocator::new([("A", 2), ("B", 3)]);
        alloc.select("A").unwrap();
        assert_eq!(alloc.next_id().unwrap(), 1);
        assert_eq!(alloc.next_id().unwrap(), 3); // overflow
        alloc.select("B").unwrap();
        assert_eq!(alloc.next_id().unwrap(), 2);
        // B exhausted; it gets 4, id 3 went to A's overflow earlier
        assert_eq!(alloc.next_id().unwrap(), 4);
    }

    #[test]
    fn test_select_errors() {
        let mut alloc = CategoryAllocator::new([("A", 5)]);
        assert!(matches!(
            alloc.select("missing"),
            Err(AllocatorError::UnknownCategory(_))
        ));
        assert!(matches!(
            alloc.next_id(),
            Err(AllocatorError::NoCategorySelected)
        ));
    }

    #[test]
    fn test_matrix_defaults() {
        let mut alloc = CategoryAllocator::matrix_defaults();
        assert_eq!(alloc.remaining_range("Visem_Demand"), Some((1, 20)));
        assert_eq!(alloc.remaining_range("Accessibilities"), Some((9000, 10000)));
        alloc.select("Demand_Pgr").unwrap();
        assert_eq!(alloc.next_id().unwrap(), 2000);
    }
}
