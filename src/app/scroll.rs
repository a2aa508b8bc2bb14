/// Largest offset that still fills a `visible`-row viewport over `total` rows.
pub fn max_scroll_offset(total: usize, visible: usize) -> usize {
    total.saturating_sub(visible.max(1))
}

pub fn clamp_scroll_offset(offset: usize, total: usize, visible: usize) -> usize {
    offset.min(max_scroll_offset(total, visible))
}

/// Re-clamps a cursor-driven window so that `offset <= cursor < offset + visible`.
///
/// `cursor` must already be inside `[0, total)` (or 0 for an empty list).
pub fn clamp_cursor_window(cursor: usize, offset: usize, total: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    let mut offset = clamp_scroll_offset(offset, total, visible);
    if cursor < offset {
        offset = cursor;
    }
    if cursor >= offset + visible {
        offset = cursor + 1 - visible;
    }
    offset
}

/// Offset that puts `line` in the middle of the viewport.
pub fn centered_offset(line: usize, total: usize, visible: usize) -> usize {
    clamp_scroll_offset(line.saturating_sub(visible / 2), total, visible)
}

pub fn clamp_cursor(cursor: usize, total: usize) -> usize {
    cursor.min(total.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_cursor() {
        assert_eq!(clamp_cursor_window(0, 0, 10, 3), 0);
        assert_eq!(clamp_cursor_window(5, 0, 10, 3), 3);
        assert_eq!(clamp_cursor_window(1, 3, 10, 3), 1);
        assert_eq!(clamp_cursor_window(9, 0, 10, 3), 7);
    }

    #[test]
    fn window_shrinks_back_when_list_gets_shorter() {
        assert_eq!(clamp_cursor_window(1, 8, 2, 5), 0);
        assert_eq!(clamp_cursor_window(0, 4, 0, 5), 0);
    }

    #[test]
    fn centering_clamps_at_both_ends() {
        assert_eq!(centered_offset(2, 100, 10), 0);
        assert_eq!(centered_offset(50, 100, 10), 45);
        assert_eq!(centered_offset(99, 100, 10), 90);
        assert_eq!(centered_offset(3, 4, 10), 0);
    }
}
