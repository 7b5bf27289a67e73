//! Delimiter heuristic for splitting marketing blurbs into listings.
//!
//! Search-result descriptions glue several listings together with
//! semicolons, but semicolons also show up mid-sentence and after
//! abbreviations. A piece shorter than [`MIN_SEGMENT_CHARS`] is treated
//! as a false split and merged forward into the current window.

/// Pieces shorter than this (in characters) do not close a window.
const MIN_SEGMENT_CHARS: usize = 20;

/// Split `text` on `delimiter`, merging short pieces into the previous
/// segment.
///
/// Walks the split pieces keeping a pending window; a piece of at
/// least [`MIN_SEGMENT_CHARS`] characters closes the window (the
/// window's pieces are re-joined with the delimiter) and the next
/// window starts after it. Trailing pieces are flushed as one final
/// segment, even when that segment is empty.
///
/// Text with no delimiter comes back as a single segment equal to the
/// input.
pub fn segment(text: &str, delimiter: &str) -> Vec<String> {
    let pieces: Vec<&str> = text.split(delimiter).collect();
    let mut segments = Vec::new();
    let mut cut = 0;

    for i in 1..pieces.len() {
        if pieces[i].chars().count() < MIN_SEGMENT_CHARS {
            continue;
        }
        segments.push(pieces[cut..=i].join(delimiter));
        cut = i + 1;
    }
    segments.push(pieces[cut..].join(delimiter));

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delimiter_yields_input_unchanged() {
        let text = "Toyota Corolla 2018 full equipo";
        assert_eq!(segment(text, ";"), vec![text.to_string()]);
    }

    #[test]
    fn long_piece_closes_window_and_tail_flushes() {
        let segments = segment("abc;defghijklmnopqrstuvwxy;z", ";");
        assert_eq!(
            segments,
            vec!["abc;defghijklmnopqrstuvwxy".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn short_pieces_merge_forward() {
        // Neither "Ltda" nor "ok" is long enough to close a window, so
        // everything stays in one segment.
        let segments = segment("Automotora Pérez;Ltda;ok", ";");
        assert_eq!(segments, vec!["Automotora Pérez;Ltda;ok".to_string()]);
    }

    #[test]
    fn trailing_delimiter_flushes_empty_segment() {
        let segments = segment("abc;defghijklmnopqrstuvwxy;", ";");
        assert_eq!(
            segments,
            vec!["abc;defghijklmnopqrstuvwxy".to_string(), String::new()]
        );
    }

    #[test]
    fn closing_piece_joins_its_window() {
        // The long piece at index 1 closes the window opened at index 0,
        // so both land in the first segment. The final long piece closes
        // its own window and the exhausted tail flushes as "".
        let text = "Automotora Pérez;Toyota Corolla 2019 $10.500.000;30.000 km unico dueño full";
        let segments = segment(text, ";");
        assert_eq!(
            segments,
            vec![
                "Automotora Pérez;Toyota Corolla 2019 $10.500.000".to_string(),
                "30.000 km unico dueño full".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn window_length_counts_characters_not_bytes() {
        // 19 multi-byte characters: still below the threshold.
        let short = "ñ".repeat(19);
        let segments = segment(&format!("abc;{short}"), ";");
        assert_eq!(segments, vec![format!("abc;{short}")]);

        // 20 characters closes the window.
        let long = "ñ".repeat(20);
        let segments = segment(&format!("abc;{long};x"), ";");
        assert_eq!(segments, vec![format!("abc;{long}"), "x".to_string()]);
    }
}
