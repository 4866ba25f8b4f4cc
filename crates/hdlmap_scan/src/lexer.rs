//! Comment and string blanking plus small cursor helpers shared by scanners.
//!
//! Blanking replaces every byte of a comment or string literal (except
//! newlines) with a space, so byte offsets and line numbers in the blanked
//! text match the original exactly.

/// Comment and string syntax of a dialect family.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CommentSyntax {
    /// `//` and `/* */` comments, `"..."` strings with backslash escapes.
    /// Used for Verilog, SystemVerilog and Bluespec.
    CStyle,
    /// As `CStyle`, plus `"""..."""` raw strings.
    Scala,
    /// `--` and `/* */` comments, `"..."` strings with `""` escapes.
    Vhdl,
}

/// Returns `text` with comments and string literals replaced by spaces.
pub fn blank(text: &str, syntax: CommentSyntax) -> String {
    let src = text.as_bytes();
    let mut out = src.to_vec();
    let len = src.len();
    let mut i = 0;

    let erase = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < len {
        let c = src[i];
        let next = src.get(i + 1).copied();

        let line_comment = match syntax {
            CommentSyntax::CStyle | CommentSyntax::Scala => c == b'/' && next == Some(b'/'),
            CommentSyntax::Vhdl => c == b'-' && next == Some(b'-'),
        };
        if line_comment {
            let end = src[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(len, |p| i + p);
            erase(&mut out, i, end);
            i = end;
            continue;
        }

        if c == b'/' && next == Some(b'*') {
            let end = find_bytes(src, i + 2, b"*/").map_or(len, |p| p + 2);
            erase(&mut out, i, end);
            i = end;
            continue;
        }

        // Character literals such as '"' in Scala and VHDL.
        if c == b'\'' && syntax != CommentSyntax::CStyle && src.get(i + 2) == Some(&b'\'') {
            i += 3;
            continue;
        }

        if c == b'"' {
            let end = match syntax {
                CommentSyntax::Scala if src[i..].starts_with(b"\"\"\"") => {
                    find_bytes(src, i + 3, b"\"\"\"").map_or(len, |p| p + 3)
                }
                CommentSyntax::Vhdl => vhdl_string_end(src, i),
                _ => c_string_end(src, i),
            };
            erase(&mut out, i, end);
            i = end;
            continue;
        }

        i += 1;
    }

    // Erased ranges start and end on ASCII delimiters, so whole characters
    // were replaced.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn find_bytes(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

fn c_string_end(src: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            // Unterminated string: stop at the end of the line.
            b'\n' => return i,
            _ => i += 1,
        }
    }
    src.len()
}

fn vhdl_string_end(src: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < src.len() {
        match src[i] {
            b'"' if src.get(i + 1) == Some(&b'"') => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    src.len()
}

/// Returns `true` for bytes that may continue an identifier.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Returns `true` for bytes that may start an identifier.
pub fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Advances past ASCII whitespace.
pub fn skip_ws(src: &[u8], mut i: usize) -> usize {
    while i < src.len() && src[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Reads an identifier starting exactly at `i`, returning its end offset.
pub fn ident_at(src: &[u8], i: usize) -> Option<usize> {
    if i < src.len() && is_ident_start(src[i]) {
        let mut j = i + 1;
        while j < src.len() && is_ident_byte(src[j]) {
            j += 1;
        }
        Some(j)
    } else {
        None
    }
}

/// Given `src[i] == open`, returns the offset just past the matching `close`.
pub fn skip_balanced(src: &[u8], i: usize, open: u8, close: u8) -> Option<usize> {
    if src.get(i) != Some(&open) {
        return None;
    }
    let mut depth = 0usize;
    for (j, &b) in src.iter().enumerate().skip(i) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(j + 1);
            }
        }
    }
    None
}

/// Returns the previous non-whitespace byte before `i`, if any.
pub fn prev_significant(src: &[u8], i: usize) -> Option<u8> {
    src[..i].iter().rev().copied().find(|b| !b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_c_comments_preserving_offsets() {
        let src = "module a; // module b;\n/* module c;\n */ endmodule";
        let out = blank(src, CommentSyntax::CStyle);
        assert_eq!(out.len(), src.len());
        assert!(!out.contains("module b"));
        assert!(!out.contains("module c"));
        assert!(out.contains("endmodule"));
        assert_eq!(out.matches('\n').count(), 2);
    }

    #[test]
    fn blanks_strings() {
        let out = blank(r#"$display("module x(");"#, CommentSyntax::CStyle);
        assert!(!out.contains("module"));
        assert!(out.starts_with("$display("));
    }

    #[test]
    fn escaped_quote_in_string() {
        let out = blank(r#"s = "a\"b module q"; module real;"#, CommentSyntax::CStyle);
        assert!(!out.contains("module q"));
        assert!(out.contains("module real"));
    }

    #[test]
    fn vhdl_comments_and_doubled_quotes() {
        let src = "entity a is -- entity b is\nx <= \"say \"\"entity c is\"\"\";";
        let out = blank(src, CommentSyntax::Vhdl);
        assert!(out.contains("entity a is"));
        assert!(!out.contains("entity b"));
        assert!(!out.contains("entity c"));
    }

    #[test]
    fn scala_triple_quotes() {
        let src = "val s = \"\"\"class Fake extends Module\"\"\"\nclass Real extends Module";
        let out = blank(src, CommentSyntax::Scala);
        assert!(!out.contains("Fake"));
        assert!(out.contains("class Real"));
    }

    #[test]
    fn quote_char_literal_is_not_a_string() {
        let src = "if (c == '\"') x\nclass Real extends Module";
        let out = blank(src, CommentSyntax::Scala);
        assert!(out.contains("class Real"));
    }

    #[test]
    fn unterminated_block_comment_runs_to_eof() {
        let out = blank("module a; /* never closed\nmodule b;", CommentSyntax::CStyle);
        assert!(out.contains("module a;"));
        assert!(!out.contains("module b"));
    }

    #[test]
    fn non_ascii_in_comment() {
        let src = "// café\nmodule m;";
        let out = blank(src, CommentSyntax::CStyle);
        assert_eq!(out.len(), src.len());
        assert!(out.ends_with("module m;"));
    }

    #[test]
    fn cursor_helpers() {
        let src = b"foo #(.W(8)) u0 [3:0] (";
        assert_eq!(ident_at(src, 0), Some(3));
        let i = skip_ws(src, 3);
        assert_eq!(src[i], b'#');
        let j = skip_ws(src, i + 1);
        assert_eq!(skip_balanced(src, j, b'(', b')'), Some(12));
        assert_eq!(skip_balanced(b"(a(b)", 0, b'(', b')'), None);
        assert_eq!(prev_significant(b"x;  \n foo", 6), Some(b';'));
    }
}
