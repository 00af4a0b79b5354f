/// Round `value` up to a multiple of `align` (a power of two).
#[inline]
pub fn align_up(value: usize, align: usize) -> Option<usize> {
    if align == 0 || !align.is_power_of_two() {
        return None;
    }
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_pages() {
        assert_eq!(align_up(0, 4096), Some(0));
        assert_eq!(align_up(1, 4096), Some(4096));
        assert_eq!(align_up(4096, 4096), Some(4096));
        assert_eq!(align_up(4097, 4096), Some(8192));
    }

    #[test]
    fn rejects_bad_alignment_and_overflow() {
        assert_eq!(align_up(10, 0), None);
        assert_eq!(align_up(10, 3), None);
        assert_eq!(align_up(usize::MAX, 16), None);
    }
}
