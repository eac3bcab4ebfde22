//! String-aware brace scanning.

/// Running state of a scan over JSON-ish text.
#[derive(Debug, Default)]
struct Scanner {
    in_string: bool,
    escape: bool,
}

impl Scanner {
    /// Feed one character; returns `true` when it is structural (outside a string).
    fn structural(&mut self, ch: char) -> bool {
        if self.escape {
            self.escape = false;
            return false;
        }
        if self.in_string {
            match ch {
                '\\' => self.escape = true,
                '"' => self.in_string = false,
                _ => {}
            }
            return false;
        }
        if ch == '"' {
            self.in_string = true;
            return false;
        }
        true
    }
}

/// Slice from the first `{` through its matching `}`.
///
/// Braces inside quoted strings (including escaped quotes) are ignored. If
/// the object never closes, the unclosed tail is returned so later stages
/// can report it as truncated. Returns `None` when there is no `{` at all.
pub(crate) fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let candidate = &text[start..];
    let mut scanner = Scanner::default();
    let mut depth = 0i32;

    for (i, ch) in candidate.char_indices() {
        if !scanner.structural(ch) {
            continue;
        }
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
            _ => {}
        }
    }

    Some(candidate)
}

/// Net brace and bracket depth outside strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Balance {
    pub braces: i32,
    pub brackets: i32,
}

impl Balance {
    pub(crate) fn is_balanced(self) -> bool {
        self.braces == 0 && self.brackets == 0
    }
}

pub(crate) fn balance(text: &str) -> Balance {
    let mut scanner = Scanner::default();
    let mut balance = Balance::default();
    for ch in text.chars() {
        if !scanner.structural(ch) {
            continue;
        }
        match ch {
            '{' => balance.braces += 1,
            '}' => balance.braces -= 1,
            '[' => balance.brackets += 1,
            ']' => balance.brackets -= 1,
            _ => {}
        }
    }
    balance
}
