//! Greedy word wrapping by character count.

/// Wrap `text` into lines of at most `max_width` characters.
///
/// Width is counted in `char`s so Hangul and other multi-byte scripts wrap at
/// the same visual width as ASCII. Words are never split; a word longer than
/// `max_width` is placed on its own line and overflows. Whitespace-only input
/// produces no lines.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
