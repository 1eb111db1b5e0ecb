//! Markup scrubbing for values that may have been persisted with HTML in them.
//!
//! This repairs previously corrupted data; it is not a security boundary.

use std::sync::OnceLock;

use regex::Regex;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

/// Unescape entities, strip every `<tag>` and trim.
pub fn clean_text(input: &str) -> String {
    let unescaped = unescape_entities(input);
    tag_pattern().replace_all(&unescaped, "").trim().to_string()
}

/// Clean every entry and drop the ones that end up empty.
pub fn clean_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| clean_text(item.as_ref()))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Decode named and numeric character references.
///
/// Numeric references (`&#233;`, `&#xE9;`) decode with or without the
/// trailing `;`; out-of-range code points become U+FFFD. Named references
/// cover the markup escapes plus Latin-1 letters and punctuation seen in
/// Portuguese text. The legacy HTML names among them (`&lt`, `&amp`,
/// `&eacute`...) also decode without `;`, matching the longest known
/// prefix. Anything else is left untouched.
pub fn unescape_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match decode_reference(candidate) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one reference at the start of `text` (which begins with `&`).
/// Returns the character and the number of bytes consumed.
fn decode_reference(text: &str) -> Option<(char, usize)> {
    let body = &text[1..];
    if let Some(num) = body.strip_prefix('#') {
        let (radix, prefix) = match num.as_bytes().first() {
            Some(b'x' | b'X') => (16, 1),
            _ => (10, 0),
        };
        let digits_len = num[prefix..]
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(num.len() - prefix);
        if digits_len == 0 || digits_len > 8 {
            return None;
        }
        let code = u32::from_str_radix(&num[prefix..prefix + digits_len], radix).ok()?;
        let mut consumed = 2 + prefix + digits_len;
        if text[consumed..].starts_with(';') {
            consumed += 1;
        }
        return Some((char::from_u32(code).unwrap_or('\u{fffd}'), consumed));
    }

    let name_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let name = &body[..name_len];
    if body[name_len..].starts_with(';') {
        if let Some(ch) = named_entity(name) {
            return Some((ch, name_len + 2));
        }
    }
    (1..=name_len)
        .rev()
        .find_map(|len| legacy_entity(&name[..len]).map(|ch| (ch, len + 1)))
}

/// Names that must be terminated by `;`.
fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "apos" => '\'',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "bull" => '•',
        "euro" => '€',
        "trade" => '™',
        _ => return legacy_entity(name),
    };
    Some(ch)
}

/// Legacy names, accepted with or without `;`.
fn legacy_entity(name: &str) -> Option<char> {
    let ch = match name {
        "lt" | "LT" => '<',
        "gt" | "GT" => '>',
        "amp" | "AMP" => '&',
        "quot" | "QUOT" => '"',
        "nbsp" => '\u{a0}',
        "laquo" => '«',
        "raquo" => '»',
        "copy" | "COPY" => '©',
        "reg" | "REG" => '®',
        "deg" => '°',
        "middot" => '·',
        "sect" => '§',
        "times" => '×',
        "ordm" => 'º',
        "ordf" => 'ª',
        "aacute" => 'á',
        "Aacute" => 'Á',
        "agrave" => 'à',
        "Agrave" => 'À',
        "acirc" => 'â',
        "Acirc" => 'Â',
        "atilde" => 'ã',
        "Atilde" => 'Ã',
        "auml" => 'ä',
        "eacute" => 'é',
        "Eacute" => 'É',
        "ecirc" => 'ê',
        "Ecirc" => 'Ê',
        "iacute" => 'í',
        "Iacute" => 'Í',
        "oacute" => 'ó',
        "Oacute" => 'Ó',
        "ocirc" => 'ô',
        "Ocirc" => 'Ô',
        "otilde" => 'õ',
        "Otilde" => 'Õ',
        "ouml" => 'ö',
        "uacute" => 'ú',
        "Uacute" => 'Ú',
        "uuml" => 'ü',
        "ccedil" => 'ç',
        "Ccedil" => 'Ç',
        "ntilde" => 'ñ',
        "Ntilde" => 'Ñ',
        _ => return None,
    };
    Some(ch)
}
