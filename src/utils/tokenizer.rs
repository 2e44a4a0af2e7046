/// Vertical tab is whitespace for line splitting but not for `u8::is_ascii_whitespace`
const VERTICAL_TAB: u8 = 0x0B;

#[inline]
pub(crate) fn is_separator(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == VERTICAL_TAB
}

/// Normalize a single whitespace-delimited token.
///
/// Keeps only ASCII letters and lowercases them. Returns `None` when nothing
/// is left, so such tokens never reach the index.
pub fn normalize_token(token: &[u8]) -> Option<String> {
    let word: String = token
        .iter()
        .filter(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_lowercase() as char)
        .collect();

    if word.is_empty() { None } else { Some(word) }
}

/// Iterator over the normalized words of one line
pub struct Words<'a> {
    rest: &'a [u8],
}

impl Iterator for Words<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            // Skip leading separators
            let start = self.rest.iter().position(|&b| !is_separator(b))?;
            let rest = &self.rest[start..];
            let end = rest.iter().position(|&b| is_separator(b)).unwrap_or(rest.len());
            let (token, tail) = rest.split_at(end);
            self.rest = tail;

            if let Some(word) = normalize_token(token) {
                return Some(word);
            }
        }
    }
}

/// Split a line into normalized words.
///
/// Works on raw bytes: non-ASCII input is never an error, its bytes are
/// simply dropped from the token they appear in.
pub fn tokenize_line(line: &[u8]) -> Words<'_> {
    Words { rest: line }
}
