//! Placeholder scanning for positional `?` markers.

/// Count the positional parameters a query expects.
///
/// Markers inside string literals, quoted identifiers and comments are
/// ignored. Numbering follows the engine: `?NNN` takes index `NNN`, a bare `?`
/// takes one more than the largest index seen so far, and the count is the
/// largest index used.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut largest = 0usize;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::Quoted(b'\''),
                b'"' => state = State::Quoted(b'"'),
                b'`' => state = State::Quoted(b'`'),
                b'[' => state = State::Bracketed,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment;
                    idx += 1;
                }
                b'?' => match scan_digits(bytes, idx + 1) {
                    Some((end, number)) => {
                        largest = largest.max(number);
                        idx = end - 1;
                    }
                    None => largest += 1,
                },
                _ => {}
            },
            State::Quoted(quote) => {
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 1; // doubled quote is an escape
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            // Block comments do not nest; the first `*/` closes them.
            State::BlockComment => {
                if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    largest
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    Quoted(u8),
    Bracketed,
    LineComment,
    BlockComment,
}

fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        return None;
    }
    std::str::from_utf8(&bytes[start..idx])
        .ok()?
        .parse()
        .ok()
        .map(|number| (idx, number))
}
