// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::ARGC_MAX;

/// How many tokens to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLimit {
    /// Stop after this many tokens, the rest of the line is ignored.
    Max(usize),
    /// Produce this many tokens normally, then the rest of the line (leading and trailing
    /// whitespace trimmed) becomes one last token with no quote or escape processing.
    RawTailAfter(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokens {
    pub argv: Vec<String>,
    /// The quote that was still open when the line ended. The line must not be executed.
    pub unterminated_quote: Option<char>,
}

impl Tokens {
    pub fn as_argv(&self) -> Vec<&str> { self.argv.iter().map(String::as_str).collect() }

    pub fn len(&self) -> usize { self.argv.len() }

    pub fn is_empty(&self) -> bool { self.argv.is_empty() }
}

pub fn tokenize(line: &str) -> Tokens { tokenize_with_limit(line, TokenLimit::Max(ARGC_MAX)) }

/// Split `line` into arguments.
///
/// - Whitespace outside of quotes separates tokens.
/// - `'...'` and `"..."` group text, the quote characters are dropped. A quote is only
///   closed by the same character that opened it.
/// - Inside quotes: `\<quote>` is a literal quote, `\0NNN` (up to 3 octal digits) and
///   `\xHH` (up to 2 hex digits) are a single byte. Any other backslash is kept as is.
/// - Outside quotes a backslash makes the next character literal, and is dropped.
pub fn tokenize_with_limit(line: &str, limit: TokenLimit) -> Tokens {
    let chars: Vec<char> = line.chars().collect();
    let (max_tokens, raw_tail_after) = match limit {
        TokenLimit::Max(max) => (max, None),
        TokenLimit::RawTailAfter(count) => (count + 1, Some(count)),
    };

    let mut argv = vec![];
    let mut quote: Option<char> = None;
    let mut index = 0;

    loop {
        while index < chars.len() && chars[index].is_whitespace() {
            index += 1;
        }
        if index >= chars.len() || argv.len() >= max_tokens {
            break;
        }

        if raw_tail_after == Some(argv.len()) {
            let tail: String = chars[index..].iter().collect();
            argv.push(tail.trim_end().to_owned());
            break;
        }

        let mut token = String::new();
        while index < chars.len() {
            let ch = chars[index];
            match quote {
                None => match ch {
                    it if it.is_whitespace() => break,
                    '\\' => {
                        if let Some(next) = chars.get(index + 1) {
                            token.push(*next);
                        }
                        index += 2;
                    }
                    '\'' | '"' => {
                        quote = Some(ch);
                        index += 1;
                    }
                    _ => {
                        token.push(ch);
                        index += 1;
                    }
                },
                Some(open) if ch == open => {
                    quote = None;
                    index += 1;
                }
                Some(open) => {
                    if ch == '\\' {
                        if let Some((byte, consumed)) = parse_escape(&chars[index + 1..], open) {
                            token.push(byte);
                            index += 1 + consumed;
                            continue;
                        }
                    }
                    token.push(ch);
                    index += 1;
                }
            }
        }
        argv.push(token);
    }

    Tokens {
        argv,
        unterminated_quote: quote,
    }
}

/// `rest` is what follows a backslash inside a quote. Returns the resulting character and
/// how many characters of `rest` it used.
fn parse_escape(rest: &[char], open_quote: char) -> Option<(char, usize)> {
    match rest.first()? {
        it if *it == open_quote => Some((open_quote, 1)),
        '0' => {
            let (value, digits) = parse_digits(&rest[1..], 8, 3)?;
            Some((char::from(value), 1 + digits))
        }
        'x' => {
            let (value, digits) = parse_digits(&rest[1..], 16, 2)?;
            Some((char::from(value), 1 + digits))
        }
        _ => None,
    }
}

/// Up to `max_digits` digits in `radix`. `None` if there isn't at least one.
fn parse_digits(rest: &[char], radix: u32, max_digits: usize) -> Option<(u8, usize)> {
    let mut value: u32 = 0;
    let mut digits = 0;
    for ch in rest.iter().take(max_digits) {
        let Some(digit) = ch.to_digit(radix) else {
            break;
        };
        value = value * radix + digit;
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    // Like a C char, octal values above 0o377 wrap.
    Some(((value & 0xFF) as u8, digits))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_quotes_and_escapes() {
        let tokens = tokenize("a 'b c' d\"e\\\"f\"g");
        assert_eq!(tokens.as_argv(), vec!["a", "b c", "de\"fg"]);
        assert_eq!(tokens.unterminated_quote, None);
    }

    #[test]
    fn test_unterminated_quote() {
        let tokens = tokenize("a 'bc");
        assert_eq!(tokens.unterminated_quote, Some('\''));
    }

    #[test_case("  ls   -l  ", &["ls", "-l"] ; "whitespace runs")]
    #[test_case("", &[] ; "empty")]
    #[test_case("a\\ b c", &["a b", "c"] ; "escaped space outside quotes")]
    #[test_case("'it''s'", &["its"] ; "adjacent quotes join")]
    #[test_case("\"a'b\"", &["a'b"] ; "other quote is literal")]
    #[test_case("'\\x41\\0101'", &["AA"] ; "hex and octal escapes")]
    #[test_case("'\\x4g'", &["\u{4}g"] ; "short hex escape")]
    #[test_case("'\\xg'", &["\\xg"] ; "hex escape without digits keeps backslash")]
    #[test_case("'\\n'", &["\\n"] ; "unknown escape keeps backslash")]
    #[test_case("\"\"", &[""] ; "empty quotes make an empty token")]
    fn test_tokenize(line: &str, expected: &[&str]) {
        let tokens = tokenize(line);
        assert_eq!(tokens.as_argv(), expected.to_vec());
        assert_eq!(tokens.unterminated_quote, None);
    }

    #[test]
    fn test_max_tokens() {
        let tokens = tokenize_with_limit("a b c d", TokenLimit::Max(2));
        assert_eq!(tokens.as_argv(), vec!["a", "b"]);

        let many = "x ".repeat(ARGC_MAX + 5);
        assert_eq!(tokenize(&many).len(), ARGC_MAX);
    }

    #[test]
    fn test_raw_tail() {
        let tokens = tokenize_with_limit("log  'x' echo \"a b\"  ", TokenLimit::RawTailAfter(2));
        assert_eq!(tokens.as_argv(), vec!["log", "x", "echo \"a b\""]);
        assert_eq!(tokens.unterminated_quote, None);
    }
}
