//! Literal-aware lexical scanning
//!
//! The engine deliberately has no tokenizer: every construct matcher works
//! directly on text through the helpers in this module. The one rule they
//! all share is that delimiters inside string literals, char literals, and
//! comments do not count. A body containing the literal `"}"` must still
//! resolve to the real closing brace.

use std::ops::Range;

/// Matching closer for an opening delimiter. `<` is only meaningful in
/// declaration position (generics), where the callers use it.
pub fn matching_close(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}

/// If `i` starts a string literal, char literal, or comment, return the
/// index just past it. Returns `None` when `i` points at ordinary code.
pub fn skip_noncode(text: &str, i: usize) -> Option<usize> {
    let rest = &text[i..];
    if rest.starts_with('"') {
        return Some(skip_string(text, i));
    }
    if rest.starts_with('\'') {
        // A tick that does not close within a literal-sized window is a
        // lifetime, not a char literal.
        return char_literal_end(text, i);
    }
    if rest.starts_with("//") {
        return Some(match text[i..].find('\n') {
            Some(nl) => i + nl + 1,
            None => text.len(),
        });
    }
    if rest.starts_with("/*") {
        return Some(skip_block_comment(text, i));
    }
    None
}

/// Scan past a `"…"` literal starting at `open_quote`, honouring `\`
/// escapes. Unterminated literals run to the end of the text.
fn skip_string(text: &str, open_quote: usize) -> usize {
    let mut escaped = false;
    for (off, ch) in text[open_quote + 1..].char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return open_quote + 1 + off + ch.len_utf8();
        }
    }
    text.len()
}

/// End of a char literal starting at `tick`, or `None` when the tick is a
/// lifetime marker (`'static`) rather than a literal opener.
fn char_literal_end(text: &str, tick: usize) -> Option<usize> {
    let rest = &text[tick + 1..];
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if first == '\'' {
        return None;
    }
    if first == '\\' {
        chars.next()?;
    }
    match chars.next() {
        Some((off, '\'')) => Some(tick + 1 + off + 1),
        _ => None,
    }
}

/// Block comments nest, matching the general dialect's rules.
fn skip_block_comment(text: &str, open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < text.len() {
        if text[i..].starts_with("/*") {
            depth += 1;
            i += 2;
        } else if text[i..].starts_with("*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += text[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    text.len()
}

/// Skip whitespace and comments from `i`.
pub fn skip_trivia(text: &str, mut i: usize) -> usize {
    loop {
        while let Some(ch) = text[i..].chars().next() {
            if ch.is_whitespace() {
                i += ch.len_utf8();
            } else {
                break;
            }
        }
        if text[i..].starts_with("//") || text[i..].starts_with("/*") {
            if let Some(next) = skip_noncode(text, i) {
                i = next;
                continue;
            }
        }
        return i;
    }
}

/// The delimiter balancer. `open` must index an opening delimiter; the scan
/// counts depth forward, suspended inside literals and comments, and returns
/// the enclosed inner range once depth returns to zero. `None` means the
/// text ended first — callers skip the construct rather than failing hard.
pub fn balanced_span(text: &str, open: usize) -> Option<Range<usize>> {
    let open_ch = text[open..].chars().next()?;
    let close_ch = matching_close(open_ch)?;
    let mut depth = 0i32;
    let mut i = open;
    while i < text.len() {
        if let Some(next) = skip_noncode(text, i) {
            i = next;
            continue;
        }
        let ch = match text[i..].chars().next() {
            Some(ch) => ch,
            None => break,
        };
        if ch == open_ch {
            depth += 1;
        } else if ch == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(open + open_ch.len_utf8()..i);
            }
        }
        i += ch.len_utf8();
    }
    None
}

/// Find `needle` at bracket depth zero, counting all three delimiter pairs.
/// Returns `None` if the enclosing scope closes (depth goes negative) or the
/// text ends first.
pub fn find_at_depth_zero(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = 0;
    while i < text.len() {
        if let Some(next) = skip_noncode(text, i) {
            i = next;
            continue;
        }
        let ch = text[i..].chars().next()?;
        if depth == 0 && ch == needle {
            return Some(i);
        }
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
        i += ch.len_utf8();
    }
    None
}

/// Find a whole-word token at bracket depth zero (used for the `in` of a
/// `for` header and the `where` of a signature).
pub fn find_token_at_depth_zero(text: &str, token: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = 0;
    while i < text.len() {
        if let Some(next) = skip_noncode(text, i) {
            i = next;
            continue;
        }
        let ch = text[i..].chars().next()?;
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
        if depth == 0 && keyword_at(text, i, token) {
            let preceded_ok = i == 0
                || !text[..i]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if preceded_ok {
                return Some(i);
            }
        }
        i += ch.len_utf8();
    }
    None
}

/// True when `kw` sits at `i` as a whole word (not a prefix of a longer
/// identifier).
pub fn keyword_at(text: &str, i: usize, kw: &str) -> bool {
    if !text[i..].starts_with(kw) {
        return false;
    }
    match text[i + kw.len()..].chars().next() {
        Some(ch) => !(ch.is_alphanumeric() || ch == '_'),
        None => true,
    }
}

/// Read an identifier starting at `i`; returns the identifier and the index
/// just past it.
pub fn ident_at(text: &str, i: usize) -> Option<(&str, usize)> {
    let mut end = i;
    for (off, ch) in text[i..].char_indices() {
        let ok = if off == 0 {
            ch.is_alphabetic() || ch == '_'
        } else {
            ch.is_alphanumeric() || ch == '_'
        };
        if !ok {
            break;
        }
        end = i + off + ch.len_utf8();
    }
    if end > i {
        Some((&text[i..end], end))
    } else {
        None
    }
}
