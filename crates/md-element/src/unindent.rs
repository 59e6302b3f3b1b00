//! Indentation normalization for inline markdown sources.

/// Replacement for a tab before indentation is measured.
const TAB: &str = "  ";

/// Strip the common leading indentation from every line.
///
/// Tabs are first rewritten as two spaces. The indent is then the minimum
/// leading-whitespace width over non-blank lines, and exactly that many
/// leading characters are removed from every line, blank lines included; a
/// line shorter than the indent becomes empty.
///
/// # Examples
///
/// ```
/// use md_element::unindent;
///
/// assert_eq!(unindent("    a\n  b\n      c"), "  a\nb\n    c");
/// assert_eq!(unindent("\ta\n  b"), "a\nb");
/// assert_eq!(unindent(""), "");
/// ```
#[must_use]
pub fn unindent(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace('\t', TAB);
    let indent = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(indent_width)
        .min()
        .unwrap_or(0);

    text.split('\n')
        .map(|line| skip_chars(line, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of leading whitespace characters.
fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Slice off the first `n` characters, or everything if the line is shorter.
fn skip_chars(line: &str, n: usize) -> &str {
    match line.char_indices().nth(n) {
        Some((idx, _)) => &line[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_common_indent() {
        assert_eq!(unindent("  a\n  b"), "a\nb");
    }

    #[test]
    fn test_minimum_indent_wins() {
        assert_eq!(unindent("    a\n  b\n      c"), "  a\nb\n    c");
    }

    #[test]
    fn test_empty_input_unchanged() {
        assert_eq!(unindent(""), "");
    }

    #[test]
    fn test_no_indent() {
        assert_eq!(unindent("# Title\n\ntext"), "# Title\n\ntext");
    }

    #[test]
    fn test_blank_lines_excluded_from_minimum() {
        assert_eq!(unindent("    a\n\n    b"), "a\n\nb");
    }

    #[test]
    fn test_short_blank_line_becomes_empty() {
        assert_eq!(unindent("    a\n  \n    b"), "a\n\nb");
    }

    #[test]
    fn test_long_blank_line_keeps_remainder() {
        assert_eq!(unindent("  a\n      \n  b"), "a\n    \nb");
    }

    #[test]
    fn test_tabs_count_as_two_spaces() {
        assert_eq!(unindent("\ta\n  b"), "a\nb");
        assert_eq!(unindent("\t  a\n  b"), "  a\nb");
    }

    #[test]
    fn test_tab_indent_keeps_relative_indent() {
        assert_eq!(unindent("\t\ta\n\tb"), "  a\nb");
    }

    #[test]
    fn test_mixed_tab_and_space_indent() {
        assert_eq!(unindent("  \tx\n\ty"), "  x\ny");
    }

    #[test]
    fn test_inner_tabs_rewritten() {
        assert_eq!(unindent("  a\tb"), "a  b");
    }

    #[test]
    fn test_script_style_source() {
        let source = "\n      # Markdown\n\n      - item\n        continued\n    ";
        assert_eq!(
            unindent(source),
            "\n# Markdown\n\n- item\n  continued\n"
        );
    }

    #[test]
    fn test_only_blank_lines() {
        assert_eq!(unindent("   \n  "), "   \n  ");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "  a\n  b",
            "    a\n  b\n      c",
            "\n      # Markdown\n\n      - item\n    ",
            "x\n  y",
        ];
        for input in inputs {
            let once = unindent(input);
            assert_eq!(unindent(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_removes_exactly_common_width() {
        let input = "      one\n        two\n      three";
        let output = unindent(input);
        for (before, after) in input.split('\n').zip(output.split('\n')) {
            assert_eq!(&before[6..], after);
        }
    }

    #[test]
    fn test_multibyte_content() {
        assert_eq!(unindent("  héllo\n  wörld"), "héllo\nwörld");
    }
}
