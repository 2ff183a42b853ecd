//! Keeps user-controlled text inside Discord's embed limits

/// Max characters in an embed field value
pub const EMBED_FIELD_LIMIT: usize = 1024;
/// Max characters in an embed description
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;

const ELLIPSIS: char = '…';

/// Cut `text` to at most `max` characters, marking the cut with `…`
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}

/// Join lines with `\n` without exceeding `max` characters
///
/// Lines that do not fit are replaced by a single trailing `…` line.
pub fn join_lines_within<I>(lines: I, max: usize) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut kept: Vec<String> = Vec::new();
    // characters of `kept` once joined
    let mut used = 0;
    let mut overflow = false;
    for line in lines {
        let cost = line.chars().count() + usize::from(!kept.is_empty());
        if used + cost > max {
            overflow = true;
            break;
        }
        used += cost;
        kept.push(line);
    }
    if !overflow {
        return kept.join("\n");
    }

    // make room for the "\n…" marker
    while !kept.is_empty() && used + 2 > max {
        if let Some(line) = kept.pop() {
            used -= line.chars().count() + usize::from(!kept.is_empty());
        }
    }
    if kept.is_empty() {
        return truncate_chars(&ELLIPSIS.to_string(), max);
    }
    kept.push(ELLIPSIS.to_string());
    kept.join("\n")
}
