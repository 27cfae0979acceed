//! Line and word helpers shared by every decoder.

/// Words kept lowercase inside a title unless they open it
const SMALL_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "in", "of", "on", "or", "the", "to",
    "with",
];

/// Return the line with leading whitespace removed
pub fn skip_whitespace(line: &str) -> &str {
    line.trim_start()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// ASCII case-insensitive prefix test
pub fn starts_with_ci(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.is_char_boundary(prefix.len())
        && line[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Text following `prefix`, trimmed. `None` when the line does not start with it.
pub fn strip_tag<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

/// Split a comma-separated list. `\,` stands for a comma inside one item.
pub fn split_list(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => items.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Text following the first `:` of the line, trimmed
pub fn after_colon(line: &str) -> &str {
    match line.find(':') {
        Some(pos) => line[pos + 1..].trim(),
        None => "",
    }
}

/// Slice `line` by character positions, clamped to its length.
pub fn char_slice(line: &str, start: usize, end: Option<usize>) -> &str {
    let byte_at = |pos: usize| {
        line.char_indices()
            .nth(pos)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    };
    let from = byte_at(start);
    let to = end.map(byte_at).unwrap_or(line.len());
    if from >= to {
        ""
    } else {
        &line[from..to]
    }
}

/// Normalize a raw title before casing.
///
/// Collapses internal whitespace, drops wrapping quotes and strips decoration
/// (dashes, asterisks, trailing punctuation) left over from banner lines.
pub fn cleanup_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_start_matches(|c: char| c == '*' || c == '-' || c == '=' || c.is_whitespace())
        .trim_end_matches(|c: char| {
            matches!(c, '*' | '-' | '=' | '.' | ':' | ',' | ';') || c.is_whitespace()
        });

    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);

    unquoted.trim().to_string()
}

/// Title-case a name. Applying it twice gives the same result.
///
/// All-uppercase input is treated as unformatted and fully recased; in mixed
/// case input, all-uppercase words (acronyms such as `BBQ`) are left alone.
pub fn title_case(src: &str) -> String {
    let has_lower = src.chars().any(|c| c.is_lowercase());

    src.split(' ')
        .enumerate()
        .map(|(index, word)| {
            let is_acronym = has_lower
                && word.chars().filter(|c| c.is_alphabetic()).count() > 1
                && word
                    .chars()
                    .filter(|c| c.is_alphabetic())
                    .all(|c| c.is_uppercase());
            if is_acronym {
                return word.to_string();
            }

            let bare: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if index > 0 && SMALL_WORDS.contains(&bare.as_str()) {
                return word.to_lowercase();
            }

            capitalize_word(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut capitalize_next = true;
    for c in word.chars() {
        if c.is_alphabetic() {
            if capitalize_next {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            capitalize_next = false;
        } else {
            out.push(c);
            capitalize_next = matches!(c, '-' | '/' | '(' | '"');
        }
    }
    out
}
