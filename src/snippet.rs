//! Static expansion of TextMate-style tab stops.
//!
//! Only the plain forms are understood: `$N`, `${N}` and `${N:default}`. Each tab stop is
//! replaced by its default text (or nothing), and `\$` yields a literal `$`. Anything else is
//! copied through unchanged.

pub(crate) fn expand(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '$' || c == '\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with("\\$") {
            out.push('$');
            rest = &rest[2..];
            continue;
        }
        if rest.starts_with('\\') {
            out.push('\\');
            rest = &rest[1..];
            continue;
        }

        match tab_stop(&rest[1..]) {
            Some((text, len)) => {
                out.push_str(&text);
                rest = &rest[1 + len..];
            }
            None => {
                out.push('$');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    out
}

/// Parses the tab stop following a `$`, returning its replacement text and its length in bytes.
fn tab_stop(s: &str) -> Option<(String, usize)> {
    let digits = count_digits(s);
    if digits > 0 {
        return Some((String::new(), digits));
    }

    let body = s.strip_prefix('{')?;
    let digits = count_digits(body);
    if digits == 0 {
        return None;
    }
    let after = &body[digits..];
    if after.starts_with('}') {
        return Some((String::new(), 1 + digits + 1));
    }

    let default = after.strip_prefix(':')?;
    let mut text = String::new();
    let mut chars = default.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.clone().next() {
                Some((_, escaped @ ('}' | '$' | '\\'))) => {
                    text.push(escaped);
                    let _ = chars.next();
                }
                _ => text.push('\\'),
            },
            '}' => return Some((text, 1 + digits + 1 + idx + 1)),
            _ => text.push(ch),
        }
    }

    None
}

fn count_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}
