//! HTML entity decoding for labels.

/// Decode the HTML entities Doxygen writes into labels (`&lt;`, `&amp;`,
/// numeric `&#NN;` / `&#xNN;` ...). Unknown or unterminated entities are left
/// untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // Entities are short; don't scan past the next whitespace or `&`.
        let semi = tail[1..]
            .find(|c: char| c == ';' || c == '&' || c.is_whitespace())
            .map(|i| i + 1)
            .filter(|&i| tail.as_bytes()[i] == b';');

        match semi.and_then(|i| lookup_entity(&tail[1..i]).map(|c| (i, c))) {
            Some((i, c)) => {
                result.push(c);
                rest = &tail[i + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);

    result
}

fn lookup_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => return None,
    })
}
