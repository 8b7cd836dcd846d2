//! Plain-text export of history rows.

use anyhow::Result;

/// Byte-order mark so spreadsheet apps detect UTF-8 in the CSV download.
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Serialize header + rows to CSV bytes, BOM-prefixed.
pub fn history_csv(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut out = Vec::from(UTF8_BOM);
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    Ok(out)
}

/// Greedy line wrap for the PDF export: cut at the last space inside the
/// limit, hard-cut when a single token exceeds it. Short lines pass through
/// untouched.
pub fn wrap_lines(lines: &[String], max_len: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    for line in lines {
        if line.chars().count() <= max_len {
            wrapped.push(line.clone());
            continue;
        }
        let mut current = line.as_str();
        while current.chars().count() > max_len {
            let cut = cut_index(current, max_len);
            wrapped.push(current[..cut].trim_end().to_string());
            current = current[cut..].trim_start();
        }
        if !current.is_empty() {
            wrapped.push(current.to_string());
        }
    }
    wrapped
}

// Byte index of the wrap point: the last space within the first `max_chars`
// characters, or the hard limit itself.
fn cut_index(text: &str, max_chars: usize) -> usize {
    let mut last_space = None;
    for (count, (idx, ch)) in text.char_indices().enumerate() {
        if count == max_chars {
            return last_space.unwrap_or(idx);
        }
        if ch == ' ' {
            last_space = Some(idx);
        }
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_starts_with_bom() {
        let out = history_csv(&["A".into(), "B".into()], &[vec!["1".into(), "2".into()]])
            .unwrap();
        assert_eq!(&out[..3], b"\xef\xbb\xbf");
        let text = String::from_utf8(out[3..].to_vec()).unwrap();
        assert_eq!(text, "A,B\n1,2\n");
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let out = history_csv(&["Amount".into()], &[vec!["84,03€".into()]]).unwrap();
        let text = String::from_utf8(out[3..].to_vec()).unwrap();
        assert_eq!(text, "Amount\n\"84,03€\"\n");
    }

    #[test]
    fn test_wrap_short_lines_untouched() {
        let lines = vec!["short".to_string(), String::new()];
        assert_eq!(wrap_lines(&lines, 90), lines);
    }

    #[test]
    fn test_wrap_cuts_at_spaces() {
        let lines = vec!["aaa bbb ccc".to_string()];
        let wrapped = wrap_lines(&lines, 8);
        assert_eq!(wrapped, vec!["aaa bbb", "ccc"]);
        // With a tighter limit the cut falls back to the earlier space.
        assert_eq!(wrap_lines(&lines, 7), vec!["aaa", "bbb ccc"]);
    }

    #[test]
    fn test_wrap_hard_cuts_long_tokens() {
        let lines = vec!["abcdefghij".to_string()];
        let wrapped = wrap_lines(&lines, 4);
        assert_eq!(wrapped, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_respects_limit() {
        let lines = vec!["Period 1: 01/01/2026 - 31/03/2026 usage 27,366m3 fees 222,13€ total 188,81€".to_string()];
        for line in wrap_lines(&lines, 40) {
            assert!(line.chars().count() <= 40, "line too long: {line}");
        }
    }

    #[test]
    fn test_wrap_handles_multibyte_text() {
        let lines = vec!["total 188,81€ and again 117,35€ and once more 84,03€".to_string()];
        let wrapped = wrap_lines(&lines, 20);
        assert!(wrapped.len() > 1);
        assert!(wrapped.concat().contains('€'));
    }
}
