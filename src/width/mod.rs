//! Terminal display width helpers.
//!
//! Banner strings may carry colour codes, so widths are measured after
//! stripping ANSI escapes.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_colour_codes() {
        assert_eq!(display_width("\x1b[32mready\x1b[0m"), 5);
    }

    #[test]
    fn counts_wide_glyphs() {
        assert_eq!(display_width("日本"), 4);
    }
}
