/*!
 * Greedy word wrapping under a per-line character limit.
 *
 * Lengths are counted in Unicode scalar values. A word longer than the limit
 * is never broken; it gets a line of its own.
 */

/// Character count used for every length limit
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Length of `words` joined by single spaces
pub fn joined_len(words: &[&str]) -> usize {
    if words.is_empty() {
        return 0;
    }
    words.iter().map(|w| char_len(w)).sum::<usize>() + words.len() - 1
}

/// Wrap words into lines of at most `max_line_length` characters
pub fn wrap_words(words: &[&str], max_line_length: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in words {
        let word_len = char_len(word);

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_line_length {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Number of leading words that fit in `max_lines` lines.
///
/// Greedy filling packs the longest possible prefix, so this is the cue
/// capacity for the word sequence. At least one word always fits.
pub fn fitting_prefix(words: &[&str], max_line_length: usize, max_lines: usize) -> usize {
    let mut lines_used = 0;
    let mut current_len = 0;

    for (i, word) in words.iter().enumerate() {
        let word_len = char_len(word);

        if lines_used == 0 {
            lines_used = 1;
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_line_length {
            current_len += 1 + word_len;
        } else {
            if lines_used == max_lines {
                return i;
            }
            lines_used += 1;
            current_len = word_len;
        }
    }

    words.len()
}
