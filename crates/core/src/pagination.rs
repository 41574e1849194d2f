//! Page bounds for list endpoints.

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `(limit, offset)` from optional query values: the limit falls in
/// `1..=MAX_PAGE_SIZE` (default [`DEFAULT_PAGE_SIZE`]), the offset is never
/// negative.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.map_or(DEFAULT_PAGE_SIZE, |l| l.clamp(1, MAX_PAGE_SIZE));
    let offset = offset.unwrap_or_default().max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        assert_eq!(page_bounds(None, None), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn limit_is_clamped_into_range() {
        assert_eq!(page_bounds(Some(0), None).0, 1);
        assert_eq!(page_bounds(Some(-5), None).0, 1);
        assert_eq!(page_bounds(Some(10_000), None).0, MAX_PAGE_SIZE);
        assert_eq!(page_bounds(Some(40), None).0, 40);
    }

    #[test]
    fn negative_offset_becomes_zero() {
        assert_eq!(page_bounds(None, Some(-10)).1, 0);
        assert_eq!(page_bounds(None, Some(75)).1, 75);
    }
}
