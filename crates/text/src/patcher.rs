use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Maps byte offsets in an original text onto a caller-modified copy.
///
/// A span lying entirely inside an unchanged region moves by that
/// region's displacement. A span overlapping any edited byte no longer
/// exists in the modified text, and `patch` reports it as gone.
pub struct Patcher {
    /// Unchanged regions, ascending by original offset.
    regions: Vec<EqualRegion>,
}

#[derive(Debug)]
struct EqualRegion {
    old_start: usize,
    old_end: usize,
    new_start: usize,
}

impl Patcher {
    /// Diffs at byte granularity so anchors inside a partially edited
    /// line still resolve.
    pub fn new(original: &[u8], dirty: &[u8]) -> Self {
        let ops = capture_diff_slices(Algorithm::Myers, original, dirty);
        let regions = ops
            .into_iter()
            .filter_map(|op| match op {
                DiffOp::Equal {
                    old_index,
                    new_index,
                    len,
                } => Some(EqualRegion {
                    old_start: old_index,
                    old_end: old_index + len,
                    new_start: new_index,
                }),
                _ => None,
            })
            .collect();
        Self { regions }
    }

    /// Maps `[start, end)` into the modified text. The flag reports
    /// whether the span still exists there.
    pub fn patch(&self, start: i32, end: i32) -> (i32, i32, bool) {
        if start < 0 || end < start {
            return (0, 0, false);
        }
        let (start, end) = (start as usize, end as usize);
        for region in &self.regions {
            if start >= region.old_start && end <= region.old_end {
                let mapped_start = region.new_start + (start - region.old_start);
                let mapped_end = region.new_start + (end - region.old_start);
                return (mapped_start as i32, mapped_end as i32, true);
            }
            if region.old_start > end {
                break;
            }
        }
        (0, 0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_before_span_shifts_it_right() {
        let patcher = Patcher::new(b"abc def", b"ab_c def");
        assert_eq!(patcher.patch(4, 7), (5, 8, true));
    }

    #[test]
    fn deletion_before_span_shifts_it_left() {
        let patcher = Patcher::new(b"hello big world", b"hello world");
        assert_eq!(patcher.patch(10, 15), (6, 11, true));
    }

    #[test]
    fn span_inside_edited_region_disappears() {
        let patcher = Patcher::new(b"fn old_name() {}", b"fn new_name() {}");
        let (_, _, exists) = patcher.patch(3, 11);
        assert!(!exists);
    }

    #[test]
    fn identical_texts_map_identically() {
        let patcher = Patcher::new(b"unchanged", b"unchanged");
        assert_eq!(patcher.patch(2, 5), (2, 5, true));
    }

    #[test]
    fn negative_or_inverted_spans_do_not_exist() {
        let patcher = Patcher::new(b"abc", b"abc");
        assert_eq!(patcher.patch(-1, 2), (0, 0, false));
        assert_eq!(patcher.patch(2, 1), (0, 0, false));
    }
}
