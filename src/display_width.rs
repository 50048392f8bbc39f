use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Left-aligns `s` in a cell `width` columns wide.
pub fn pad_to(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    let mut out = String::with_capacity(s.len() + fill);
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

/// Cuts `s` to at most `max` columns, marking the cut with `…`.
pub fn truncate_to(s: &str, max: usize) -> String {
    if display_width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let budget = max - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wide_glyphs_count_double() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("数据库"), 6);
    }

    #[test]
    fn pad_uses_columns_not_bytes() {
        assert_eq!(pad_to("库", 4), "库  ");
        assert_eq!(pad_to("long", 2), "long");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate_to("gateway", 10), "gateway");
        assert_eq!(truncate_to("gateway", 4), "gat…");
        assert_eq!(truncate_to("数据库服务", 5), "数据…");
        assert_eq!(truncate_to("x", 0), "");
    }
}
