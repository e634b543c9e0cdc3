//! Text-shape helpers shared by the refactoring crates.
//!
//! These operate on byte offsets into UTF-8 buffers and deliberately know
//! nothing about syntax; indentation is "whatever horizontal whitespace
//! starts the line".

/// Byte offset of the first character of the line containing `offset`.
pub fn line_start_offset(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

/// The horizontal whitespace prefix of the line containing `offset`, up to
/// `offset` itself.
pub fn indentation_at(source: &str, offset: usize) -> String {
    let start = line_start_offset(source, offset);
    source[start..offset]
        .chars()
        .take_while(|c| c.is_whitespace() && *c != '\n' && *c != '\r')
        .collect()
}

/// Re-indent a block of text from `old_indent` to `new_indent`.
///
/// Lines that do not start with `old_indent` (e.g. hanging continuations
/// that were indented deeper, or blank lines) keep their remaining prefix;
/// blank lines receive no indentation at all.
pub fn reindent(block: &str, old_indent: &str, new_indent: &str) -> String {
    let mut out = String::with_capacity(block.len());
    for line in block.split_inclusive('\n') {
        let has_newline = line.ends_with('\n');
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let line = line.strip_prefix(old_indent).unwrap_or(line);
        if !line.trim().is_empty() {
            out.push_str(new_indent);
        }
        out.push_str(line);
        if has_newline {
            out.push('\n');
        }
    }
    if !block.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_start_at_document_start() {
        assert_eq!(line_start_offset("abc", 2), 0);
        assert_eq!(line_start_offset("a\nbc", 3), 2);
    }

    #[test]
    fn indentation_stops_at_first_non_space() {
        let src = "    int x = 1;";
        assert_eq!(indentation_at(src, 4), "    ");
        assert_eq!(indentation_at(src, 9), "    ");
    }

    #[test]
    fn reindent_shifts_nested_lines() {
        let block = "        a();\n            b();\n";
        assert_eq!(reindent(block, "        ", "    "), "    a();\n        b();\n");
    }

    #[test]
    fn reindent_leaves_blank_lines_bare() {
        let block = "    a();\n\n    b();";
        assert_eq!(reindent(block, "    ", "  "), "  a();\n\n  b();");
    }
}
