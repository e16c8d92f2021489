use std::borrow::Cow;

const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

// Longest reference we try to decode, including `&` and `;`.
const MAX_REFERENCE_LEN: usize = 12;

/// Decode character references in text or attribute values.
///
/// Only the handful of named references that show up in serialized
/// attribute values are recognized, plus decimal and hex numeric
/// references. Anything else is left as written.
#[must_use]
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match decode_reference(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Decode the reference at the start of `input` (which begins with `&`),
/// returning the character and the number of bytes consumed.
fn decode_reference(input: &str) -> Option<(char, usize)> {
    let mut end = input.len().min(MAX_REFERENCE_LEN);
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    let window = &input[..end];
    let semi = window.find(';')?;
    let body = &window[1..semi];

    let ch = if let Some(numeric) = body.strip_prefix('#') {
        let code = if let Some(hex) = numeric
            .strip_prefix('x')
            .or_else(|| numeric.strip_prefix('X'))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            numeric.parse::<u32>().ok()?
        };
        char::from_u32(code)?
    } else {
        NAMED
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, ch)| *ch)?
    };

    Some((ch, semi + 1))
}
