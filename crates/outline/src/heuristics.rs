//! Stateless text predicates used to reject implausible heading candidates.
//!
//! Each rule is a pure function over a string so its contribution to the
//! filter can be tested in isolation. Note the deliberate asymmetry between
//! [`is_numbering_only`] and [`is_likely_paragraph`]: the former rejects bare
//! numbers and bullets ("1.", "3.2.1"), never "number + word" combinations
//! like "1 Overview".

/// How many distinct characters from `marks` occur anywhere in `text`.
fn distinct_marks_present(text: &str, marks: &str) -> usize {
    marks.chars().filter(|&m| text.contains(m)).count()
}

/// Does this text read like a body paragraph rather than a heading?
///
/// True when any of: more than 10 words; ends with `.` or `?`; starts with a
/// lowercase letter; at least two of `.` `;` `,` appear; average word length
/// below 3.5 characters.
pub fn is_likely_paragraph(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > 10 {
        return true;
    }
    if text.ends_with('.') || text.ends_with('?') {
        return true;
    }
    if text.chars().next().is_some_and(|c| c.is_lowercase()) {
        return true;
    }
    if distinct_marks_present(text, ".;,") >= 2 {
        return true;
    }
    let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
    let avg_word_len = total_len as f64 / words.len().max(1) as f64;
    avg_word_len < 3.5
}

/// Is this text nothing but numbering (section numbers, bullets, dashes)?
///
/// The check strips `.`, `-`, and the mojibake en-dash sequence `â€“` before
/// testing. "1 Overview" survives; "3.2.1" does not.
pub fn is_numbering_only(text: &str) -> bool {
    let stripped: String = text
        .trim()
        .replace('.', "")
        .replace('-', "")
        .replace("â€“", "");

    if stripped.is_empty() {
        return true;
    }
    if stripped.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if stripped.chars().count() < 4
        && text.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return true;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.len() <= 2
        && !tokens.is_empty()
        && tokens.iter().all(|w| {
            let w = w.trim();
            let undotted: String = w.replace('.', "");
            (!w.is_empty() && w.chars().all(|c| c.is_ascii_digit()))
                || (!undotted.is_empty() && undotted.chars().all(|c| c.is_ascii_digit()))
        })
}

/// Extra-strict plausibility check applied to H3 candidates only.
///
/// True when any of: more than 10 words; ends like a sentence (`.`/`?`);
/// lowercase start; fewer than 2 uppercase characters; at least three of
/// `.` `,` `;` `:` `!` `?` appear.
pub fn is_bad_h3(text: &str) -> bool {
    let too_long = text.split_whitespace().count() > 10;
    let ends_like_sentence = text.ends_with('.') || text.ends_with('?');
    let lowercase_start = text.chars().next().is_some_and(|c| c.is_lowercase());
    let few_caps = text.chars().filter(|c| c.is_uppercase()).count() < 2;
    let too_much_punct = distinct_marks_present(text, ".,;:!?") >= 3;

    too_long || ends_like_sentence || lowercase_start || few_caps || too_much_punct
}
