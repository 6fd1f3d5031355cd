//! Text normalization ahead of drawing.
//!
//! Standard and embedded faces are both addressed with single-byte WinAnsi
//! codes, so every string goes through `sanitize_text` before it is measured
//! or drawn. The result only contains `\n`, printable ASCII and Latin-1
//! characters `0xA1..=0xFF`.

/// Strips markup, decodes entities and maps typographic characters onto
/// their single-byte equivalents. Unsupported code points are dropped.
pub fn sanitize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let stripped = if looks_like_markup(&unified) {
        strip_tags(&unified)
    } else {
        unified
    };
    let decoded = decode_entities(&stripped);

    let mut out = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' => out.push(' '),
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2022}' | '\u{25CF}' | '\u{25E6}' | '\u{2043}' | '\u{2219}' | '\u{25AA}' => {
                out.push('-')
            }
            '\u{2026}' => out.push_str("..."),
            '\u{20AC}' => out.push_str("EUR"),
            '\u{2122}' => out.push_str("TM"),
            c if is_single_byte_safe(c) => out.push(c),
            _ => {}
        }
    }
    out.trim_matches(|c: char| c == '\n' || c == ' ').to_string()
}

fn is_single_byte_safe(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA1..=0xFF)
}

/// Encodes an already-sanitized string as WinAnsi bytes for a `Tj` operand.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| u8::try_from(c as u32).ok())
        .filter(|b| *b >= 0x20)
        .collect()
}

/// True when the value contains something shaped like an HTML tag.
pub fn looks_like_markup(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.windows(2).enumerate().any(|(i, pair)| {
        pair[0] == b'<'
            && (pair[1].is_ascii_alphabetic() || pair[1] == b'/' || pair[1] == b'!')
            && text[i..].contains('>')
    })
}

/// Removes tags, turning block-level boundaries into line breaks.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            out.push_str(after);
            rest = "";
            break;
        };
        let tag = after[1..close].trim().to_ascii_lowercase();
        if breaks_line(&tag) {
            out.push('\n');
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    // Source markup is usually indented; only tag-derived breaks are kept.
    out.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn breaks_line(tag: &str) -> bool {
    let name: String = tag
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    let closing = tag.starts_with('/');
    match name.as_str() {
        "br" => true,
        "p" | "div" | "li" | "tr" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            closing
        }
        _ => false,
    }
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&after[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bull" => '\u{2022}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "deg" => '\u{00B0}',
        "middot" => '\u{00B7}',
        "times" => '\u{00D7}',
        "eacute" => '\u{00E9}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(sanitize_text("Jane Doe"), "Jane Doe");
    }

    #[test]
    fn test_markup_is_stripped_with_block_breaks() {
        let text = sanitize_text("<p>First <b>bold</b> line</p><p>Second</p>");
        assert_eq!(text, "First bold line\nSecond");
    }

    #[test]
    fn test_br_becomes_newline() {
        assert_eq!(sanitize_text("one<br/>two<br>three"), "one\ntwo\nthree");
    }

    #[test]
    fn test_less_than_in_prose_is_not_markup() {
        assert_eq!(sanitize_text("score < 40 is a fail"), "score < 40 is a fail");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            sanitize_text("Tom &amp; Jerry &lt;3 &#65;&#x42;"),
            "Tom & Jerry <3 AB"
        );
        assert_eq!(sanitize_text("a &unknown; b"), "a &unknown; b");
    }

    #[test]
    fn test_typographic_characters_are_mapped() {
        let text = sanitize_text("\u{201C}Great\u{201D} \u{2014} it\u{2019}s done\u{2026}");
        assert_eq!(text, "\"Great\" - it's done...");
    }

    #[test]
    fn test_bullets_and_tabs_are_normalized() {
        assert_eq!(sanitize_text("\u{2022}\tItem"), "- Item");
    }

    #[test]
    fn test_unsupported_code_points_are_dropped() {
        let text = sanitize_text("Caf\u{00E9} \u{1F600} \u{4E2D}ok");
        assert_eq!(text, "Caf\u{00E9}  ok");
        assert!(text.chars().all(|c| c == '\n' || is_single_byte_safe(c)));
    }

    #[test]
    fn test_blank_lines_are_preserved_inside_text() {
        assert_eq!(sanitize_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_encode_win_ansi_keeps_latin1_bytes() {
        assert_eq!(encode_win_ansi("A\u{00E9}"), vec![0x41, 0xE9]);
    }
}
