//! Textual list encoding used for list-valued workbook cells.
//!
//! A list is stored in one cell as its literal representation, e.g.
//! `['uploads/1_a.pdf', "it's.txt"]`. Reading is tolerant: anything that
//! does not parse degrades to an empty list at the call site.

/// Render a list of strings as a single-cell literal.
pub fn render(items: &[String]) -> String {
    let mut out = String::from("[");
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        push_quoted(&mut out, item);
    }
    out.push(']');
    out
}

/// Parse a literal produced by [`render`] (or written by hand / by other
/// tools using double quotes). Empty input is the empty list.
pub fn parse(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Vec::new());
    }

    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        let Some(&first) = chars.peek() else {
            break;
        };

        let item = if first == '\'' || first == '"' {
            chars.next();
            read_quoted(&mut chars, first)?
        } else {
            read_bare(&mut chars)?
        };
        items.push(item);

        skip_whitespace(&mut chars);
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }

    Some(items)
}

/// Parse, degrading malformed input to an empty list.
pub fn parse_or_empty(text: &str) -> Vec<String> {
    match parse(text) {
        Some(items) => items,
        None => {
            tracing::debug!(value = text, "unparseable list literal, using empty list");
            Vec::new()
        }
    }
}

fn push_quoted(out: &mut String, value: &str) {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn skip_whitespace(chars: &mut Chars<'_>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn read_quoted(chars: &mut Chars<'_>, quote: char) -> Option<String> {
    let mut out = String::new();
    loop {
        let ch = chars.next()?;
        if ch == quote {
            return Some(out);
        }
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            'x' => out.push(read_hex(chars, 2)?),
            'u' => out.push(read_hex(chars, 4)?),
            'U' => out.push(read_hex(chars, 8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
}

fn read_hex(chars: &mut Chars<'_>, digits: usize) -> Option<char> {
    let mut code = 0u32;
    for _ in 0..digits {
        let digit = chars.next()?.to_digit(16)?;
        code = code * 16 + digit;
    }
    char::from_u32(code)
}

/// Unquoted scalars (numbers, `None`) are kept as their text.
fn read_bare(chars: &mut Chars<'_>) -> Option<String> {
    let mut out = String::new();
    while let Some(&ch) = chars.peek() {
        if ch == ',' {
            break;
        }
        if matches!(ch, '[' | ']' | '\'' | '"') {
            return None;
        }
        out.push(ch);
        chars.next();
    }
    let value = out.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
