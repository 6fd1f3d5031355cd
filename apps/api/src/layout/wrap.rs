//! Greedy word wrap against measured glyph widths.

use crate::layout::font_metrics::GlyphMetrics;

/// Line advance as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

pub fn line_height(font_size_pt: f32) -> f32 {
    font_size_pt * LINE_HEIGHT_FACTOR
}

/// Number of lines that fit in a box of `height_pt`.
pub fn max_lines(height_pt: f32, font_size_pt: f32) -> usize {
    if height_pt <= 0.0 || font_size_pt <= 0.0 {
        return 0;
    }
    (height_pt / line_height(font_size_pt)).floor() as usize
}

/// Splits `text` on explicit line breaks (blank lines kept), then wraps each
/// paragraph so no line is wider than `width_pt`.
///
/// Words longer than the box are broken between characters. A single glyph
/// wider than the box is still placed on its own line.
pub fn wrap_text(
    text: &str,
    metrics: &GlyphMetrics,
    font_size_pt: f32,
    width_pt: f32,
) -> Vec<String> {
    let space_w = metrics.width_pt(" ", font_size_pt);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in words {
            let word_w = metrics.width_pt(word, font_size_pt);

            if word_w > width_pt {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = break_word(word, metrics, font_size_pt, width_pt);
                let last = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                current_width = metrics.width_pt(&last, font_size_pt);
                current = last;
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w <= width_pt {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_width = word_w;
            }
        }
        lines.push(current);
    }

    lines
}

fn break_word(word: &str, metrics: &GlyphMetrics, font_size_pt: f32, width_pt: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for c in word.chars() {
        let mut buf = [0u8; 4];
        let char_w = metrics.width_pt(c.encode_utf8(&mut buf), font_size_pt);
        if !current.is_empty() && current_width + char_w > width_pt {
            pieces.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        current.push(c);
        current_width += char_w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{get_metrics, StandardFont};

    fn helvetica() -> GlyphMetrics {
        GlyphMetrics::Table(get_metrics(StandardFont::Helvetica))
    }

    #[test]
    fn test_short_value_stays_on_one_line() {
        let lines = wrap_text("Jane Doe", &helvetica(), 14.0, 300.0);
        assert_eq!(lines, vec!["Jane Doe".to_string()]);
    }

    #[test]
    fn test_no_line_exceeds_width() {
        let metrics = helvetica();
        let text = "Your performance in the quantitative section was outstanding and \
                    places you among the strongest candidates of this cycle.";
        let lines = wrap_text(text, &metrics, 14.0, 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            let w = metrics.width_pt(line, 14.0);
            assert!(w <= 80.0 + 1e-3, "line {line:?} is {w}pt wide");
        }
    }

    #[test]
    fn test_overlong_word_is_broken_by_characters() {
        let metrics = helvetica();
        let lines = wrap_text("Supercalifragilisticexpialidocious", &metrics, 12.0, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "Supercalifragilisticexpialidocious");
        for line in &lines {
            assert!(metrics.width_pt(line, 12.0) <= 60.0 + 1e-3);
        }
    }

    #[test]
    fn test_explicit_breaks_keep_blank_lines() {
        let lines = wrap_text("first\n\nthird", &helvetica(), 12.0, 200.0);
        assert_eq!(lines, vec!["first", "", "third"]);
    }

    #[test]
    fn test_max_lines_uses_floor() {
        assert_eq!(max_lines(20.0, 14.0), 1);
        assert_eq!(max_lines(50.4, 14.0), 3);
        assert_eq!(max_lines(10.0, 14.0), 0);
        assert_eq!(max_lines(0.0, 14.0), 0);
    }

    #[test]
    fn test_word_following_broken_word_continues_last_piece() {
        let metrics = helvetica();
        let lines = wrap_text("WWWWWWWWWW a", &metrics, 10.0, 40.0);
        let last = lines.last().cloned().unwrap_or_default();
        assert!(last.ends_with(" a") || last == "a");
    }

    #[test]
    fn test_latin1_text_wraps_at_its_real_width() {
        let metrics = helvetica();
        // Helvetica Æ advances a full em: five fit in 80pt at 14pt, six do not.
        let lines = wrap_text(&"Æ".repeat(20), &metrics, 14.0, 80.0);
        assert_eq!(lines, vec!["ÆÆÆÆÆ".to_string(); 4]);

        let text = "Señor Müller réussit ¼ des épreuves © Æsir Ørsted";
        // Helvetica AFM advances, in em.
        let afm_em = |c: char| -> f32 {
            match c {
                ' ' => 0.278,
                'S' => 0.667,
                'M' => 0.833,
                'Æ' => 1.000,
                'Ø' => 0.778,
                '¼' => 0.834,
                '©' => 0.737,
                'r' => 0.333,
                't' => 0.278,
                'l' | 'i' => 0.222,
                's' | 'v' => 0.500,
                // e é ñ o ü u d p
                _ => 0.556,
            }
        };
        let lines = wrap_text(text, &metrics, 14.0, 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            let expected = line.chars().map(afm_em).sum::<f32>() * 14.0;
            let measured = metrics.width_pt(line, 14.0);
            assert!((measured - expected).abs() < 1e-2, "{line:?}: {measured} vs {expected}");
            assert!(measured <= 80.0 + 1e-3, "{line:?} is {measured}pt wide");
        }
    }
}
