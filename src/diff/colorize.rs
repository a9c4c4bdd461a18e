//! Coloring diff output for tools that cannot do it themselves.
//!
//! Side-by-side output is classified by the gutter marker. GNU diff at its
//! default width puts the marker at a fixed column, which is why the column is
//! a parameter (see `diff.marker_column`). Columns count characters, not bytes.

use crate::resolve::Layout;
use colored::Colorize;

/// What a single line of diff output represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Unchanged context, or a `<`/`>` content line in vertical output.
    Plain,
    /// A side-by-side row whose sides differ.
    Changed,
    /// The `---` separator between old and new lines in vertical output.
    Separator,
    /// A command line such as `3c3` or `5,7d4` in vertical output.
    Header,
}

/// Classify a side-by-side row.
///
/// A row differs when it ends with ` <` (left only) or has ` >` (right only)
/// or ` |` (changed) at `marker_column`.
#[must_use]
pub fn classify_side_by_side(line: &str, marker_column: usize) -> LineClass {
    if line.ends_with(" <") {
        return LineClass::Changed;
    }

    let mut marker = line.chars().skip(marker_column);
    match (marker.next(), marker.next()) {
        (Some(' '), Some('>' | '|')) => LineClass::Changed,
        _ => LineClass::Plain,
    }
}

/// Classify a line of classic (vertical) diff output.
#[must_use]
pub fn classify_vertical(line: &str) -> LineClass {
    if line == "---" {
        LineClass::Separator
    } else if line.is_empty() || line.starts_with('<') || line.starts_with('>') {
        LineClass::Plain
    } else {
        LineClass::Header
    }
}

/// Color `output` line by line for `layout`.
///
/// Side by side, changed rows are bright yellow. Vertically, `---` is bright
/// red and command headers are bright yellow with a blank line before them.
/// Whether escapes are actually emitted follows the active
/// [`crate::output::ColorScope`].
#[must_use]
pub fn colorize(output: &str, layout: Layout, marker_column: usize) -> String {
    let mut rendered = String::with_capacity(output.len() + output.len() / 4);

    for raw in output.split_inclusive('\n') {
        let (line, ending) = split_ending(raw);
        match layout {
            Layout::SideBySide => match classify_side_by_side(line, marker_column) {
                LineClass::Changed => rendered.push_str(&line.bright_yellow().to_string()),
                _ => rendered.push_str(line),
            },
            Layout::Vertical => match classify_vertical(line) {
                LineClass::Separator => rendered.push_str(&line.bright_red().to_string()),
                LineClass::Header => {
                    rendered.push_str(if ending.is_empty() { "\n" } else { ending });
                    rendered.push_str(&line.bright_yellow().to_string());
                }
                LineClass::Plain | LineClass::Changed => rendered.push_str(line),
            },
        }
        rendered.push_str(ending);
    }

    rendered
}

/// Split `raw` into its content and its `\n` or `\r\n` terminator (empty on the last line)
fn split_ending(raw: &str) -> (&str, &str) {
    let content_len = raw.trim_end_matches(['\n', '\r']).len();
    raw.split_at(content_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MARKER_COLUMN;
    use proptest::prelude::*;
    use rstest::rstest;
    use serial_test::serial;

    /// A side-by-side row with `left` padded to the marker column
    fn row(left: &str, marker: char, right: &str) -> String {
        format!("{left:<63} {marker} {right}")
    }

    #[rstest]
    #[case(row("same", ' ', "same"), LineClass::Plain)]
    #[case(row("old", '|', "new"), LineClass::Changed)]
    #[case(row("", '>', "added"), LineClass::Changed)]
    #[case(format!("{:<63} <", "removed"), LineClass::Changed)]
    #[case("short line".to_string(), LineClass::Plain)]
    #[case(String::new(), LineClass::Plain)]
    fn test_side_by_side(#[case] line: String, #[case] expected: LineClass) {
        assert_eq!(classify_side_by_side(&line, DEFAULT_MARKER_COLUMN), expected);
    }

    #[test]
    fn test_marker_column_counts_characters() {
        // 63 two-byte characters still put the marker at character 63
        let line = format!("{} | right", "é".repeat(63));
        assert_eq!(classify_side_by_side(&line, DEFAULT_MARKER_COLUMN), LineClass::Changed);
    }

    #[test]
    fn test_marker_elsewhere_is_ignored() {
        let line = format!("{:<40} | {}", "a", "b");
        assert_eq!(classify_side_by_side(&line, DEFAULT_MARKER_COLUMN), LineClass::Plain);
        assert_eq!(classify_side_by_side(&line, 40), LineClass::Changed);
    }

    #[rstest]
    #[case("---", LineClass::Separator)]
    #[case("3c3", LineClass::Header)]
    #[case("5,7d4", LineClass::Header)]
    #[case("< old text", LineClass::Plain)]
    #[case("> new text", LineClass::Plain)]
    #[case("", LineClass::Plain)]
    #[case("----", LineClass::Header)]
    fn test_vertical(#[case] line: &str, #[case] expected: LineClass) {
        assert_eq!(classify_vertical(line), expected);
    }

    #[test]
    #[serial]
    fn test_vertical_rendering() {
        colored::control::set_override(true);
        let rendered = colorize("3c3\n< old\n---\n> new\n", Layout::Vertical, DEFAULT_MARKER_COLUMN);
        colored::control::unset_override();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "\u{1b}[93m3c3\u{1b}[0m");
        assert_eq!(lines[2], "< old");
        assert_eq!(lines[3], "\u{1b}[91m---\u{1b}[0m");
        assert_eq!(lines[4], "> new");
    }

    #[test]
    #[serial]
    fn test_side_by_side_rendering() {
        let changed = row("old", '|', "new");
        let same = row("same", ' ', "same");
        let input = format!("{same}\n{changed}\n");

        colored::control::set_override(true);
        let rendered = colorize(&input, Layout::SideBySide, DEFAULT_MARKER_COLUMN);
        colored::control::unset_override();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], same);
        assert!(lines[1].starts_with("\u{1b}[93m"));
        assert!(lines[1].contains(&changed));
    }

    #[test]
    #[serial]
    fn test_no_escapes_when_colors_disabled() {
        colored::control::set_override(false);
        let rendered = colorize("1c1\n< a\n---\n> b\n", Layout::Vertical, DEFAULT_MARKER_COLUMN);
        colored::control::unset_override();
        assert_eq!(rendered, "\n1c1\n< a\n---\n> b\n");
    }

    #[test]
    #[serial]
    fn test_line_endings_are_preserved() {
        colored::control::set_override(false);
        let crlf = colorize("1c1\r\n< a\r\n---\r\n> b", Layout::Vertical, DEFAULT_MARKER_COLUMN);
        let sbs = colorize("same    same", Layout::SideBySide, DEFAULT_MARKER_COLUMN);
        let trailing_header = colorize("< a\n5d4", Layout::Vertical, DEFAULT_MARKER_COLUMN);
        colored::control::unset_override();

        assert_eq!(crlf, "\r\n1c1\r\n< a\r\n---\r\n> b");
        assert_eq!(sbs, "same    same");
        assert_eq!(trailing_header, "< a\n\n5d4");
    }

    proptest! {
        #[test]
        fn prop_content_lines_are_never_headers(text in "[<>][^\n]{0,80}") {
            prop_assert_eq!(classify_vertical(&text), LineClass::Plain);
        }

        #[test]
        fn prop_short_lines_are_plain(text in "[^\n]{0,62}") {
            prop_assume!(!text.ends_with(" <"));
            prop_assert_eq!(classify_side_by_side(&text, DEFAULT_MARKER_COLUMN), LineClass::Plain);
        }

        #[test]
        #[serial]
        fn prop_side_by_side_text_survives_without_color(text in "[a-z |<>\r\n]{0,200}") {
            colored::control::set_override(false);
            let rendered = colorize(&text, Layout::SideBySide, DEFAULT_MARKER_COLUMN);
            colored::control::unset_override();
            prop_assert_eq!(rendered, text);
        }

        #[test]
        fn prop_classification_never_panics(text in "\\PC{0,200}", column in 0usize..200) {
            let _ = classify_side_by_side(&text, column);
            let _ = classify_vertical(&text);
        }
    }
}
