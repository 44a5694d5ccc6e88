//! Escaping for values embedded in an FFmpeg filter graph.
//!
//! A `-filter_complex` value is tokenized twice: once by the graph parser
//! (delimiters `[ ] , ;`) and once more by the filter's option parser
//! (delimiter `:`). Both levels strip a layer of backslashes and treat `'`
//! as a quote, so a literal value is escaped for the option level first and
//! the result escaped again for the graph level.

/// Characters the option parser treats specially.
const OPTION_SPECIAL: [char; 3] = ['\\', '\'', ':'];

/// Characters the graph parser treats specially.
const GRAPH_SPECIAL: [char; 6] = ['\\', '\'', '[', ']', ',', ';'];

fn escape_chars(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape an arbitrary option value for use unquoted inside a filter graph.
pub(crate) fn escape_filter_value(value: &str) -> String {
    escape_chars(&escape_chars(value, &OPTION_SPECIAL), &GRAPH_SPECIAL)
}

/// Escape caption text for a drawtext `text=` value.
///
/// Control characters (newlines, tabs) become spaces and the result is
/// trimmed, then escaped for both parser levels. `%` needs no escape here
/// because drawtext is emitted with `expansion=none`.
pub fn sanitize_overlay_text(s: &str) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    escape_filter_value(flat.trim())
}

#[cfg(test)]
pub(crate) mod graph_parse {
    //! Minimal re-implementation of FFmpeg's `av_get_token` and the two
    //! tokenizing passes applied to a filter graph.

    const WHITESPACE: [char; 4] = [' ', '\n', '\t', '\r'];

    /// Read one token up to any `term` character, returning it and the rest.
    pub fn get_token(input: &str, term: &[char]) -> (String, String) {
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;
        while i < chars.len() && WHITESPACE.contains(&chars[i]) {
            i += 1;
        }

        let mut out = String::new();
        let mut protected = 0;
        while i < chars.len() && !term.contains(&chars[i]) {
            let c = chars[i];
            i += 1;
            if c == '\\' && i < chars.len() {
                out.push(chars[i]);
                i += 1;
                protected = out.len();
            } else if c == '\'' {
                while i < chars.len() && chars[i] != '\'' {
                    out.push(chars[i]);
                    i += 1;
                }
                if i < chars.len() {
                    i += 1;
                    protected = out.len();
                }
            } else {
                out.push(c);
            }
        }

        let trimmed = out.trim_end_matches(|c: char| WHITESPACE.contains(&c)).len();
        let keep = protected.max(trimmed);
        out.truncate(keep);
        (out, chars[i..].iter().collect())
    }

    fn skip_labels(mut rest: String) -> String {
        while rest.starts_with('[') {
            let close = rest.find(']').expect("unterminated link label");
            rest = rest[close + 1..].to_string();
        }
        rest
    }

    /// Split a graph into `(filter name, unescaped args)` pairs.
    pub fn parse_graph(graph: &str) -> Vec<(String, String)> {
        let mut filters = Vec::new();
        let mut rest = graph.to_string();
        loop {
            rest = skip_labels(rest);
            if let Some(tail) = rest.strip_prefix(|c: char| c == ',' || c == ';') {
                rest = tail.to_string();
                continue;
            }
            if rest.is_empty() {
                break;
            }

            let (name, tail) = get_token(&rest, &['=', ',', ';', '[']);
            assert!(!name.is_empty(), "no filter name at {rest:?}");
            rest = tail;

            let mut args = String::new();
            if let Some(tail) = rest.strip_prefix('=') {
                let (parsed, tail) = get_token(tail, &['[', ']', ',', ';']);
                args = parsed;
                rest = tail;
            }
            filters.push((name, args));
        }
        filters
    }

    /// Split filter args into `key=value` options.
    pub fn parse_options(args: &str) -> Vec<(String, String)> {
        let mut options = Vec::new();
        let mut rest = args.to_string();
        while !rest.is_empty() {
            let eq = rest.find('=').expect("option without key");
            let key = rest[..eq].to_string();
            let (value, tail) = get_token(&rest[eq + 1..], &[':']);
            options.push((key, value));
            rest = tail.strip_prefix(':').unwrap_or(&tail).to_string();
        }
        options
    }

    #[test]
    fn test_get_token_matches_ffmpeg_rules() {
        assert_eq!(get_token("a\\,b,c", &[',']), ("a,b".to_string(), ",c".to_string()));
        assert_eq!(get_token("'x:y'z:w", &[':']), ("x:yz".to_string(), ":w".to_string()));
        assert_eq!(get_token("  pad  :", &[':']), ("pad".to_string(), ":".to_string()));
        assert_eq!(get_token("pad\\ :", &[':']), ("pad ".to_string(), ":".to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::graph_parse::get_token;
    use super::*;

    /// Undo both parser levels the way FFmpeg would for a single value.
    fn unescape_twice(escaped: &str) -> String {
        let (graph_level, rest) = get_token(escaped, &['[', ']', ',', ';']);
        assert!(rest.is_empty(), "graph level stopped early at {rest:?}");
        let (option_level, rest) = get_token(&graph_level, &[':']);
        assert!(rest.is_empty(), "option level stopped early at {rest:?}");
        option_level
    }

    #[test]
    fn test_structural_characters_survive_both_levels() {
        let out = sanitize_overlay_text("it's: a, test");
        assert_eq!(out, "it\\\\\\'s\\\\: a\\, test");
        assert_eq!(unescape_twice(&out), "it's: a, test");
    }

    #[test]
    fn test_injection_attempt_stays_inert() {
        let text = "x'[out];movie=/etc/passwd[a];[a]null,%{pts}:y=0";
        assert_eq!(unescape_twice(&sanitize_overlay_text(text)), text);
    }

    #[test]
    fn test_backslash_survives() {
        let out = sanitize_overlay_text("a\\:b");
        assert_eq!(unescape_twice(&out), "a\\:b");
    }

    #[test]
    fn test_control_characters_become_spaces() {
        assert_eq!(sanitize_overlay_text("  line1\nline2\t "), "line1 line2");
    }

    #[test]
    fn test_hangul_untouched() {
        assert_eq!(sanitize_overlay_text("안녕하세요"), "안녕하세요");
    }

    #[test]
    fn test_escape_filter_value_for_paths() {
        let path = "C:\\fonts\\a'b,c.ttf";
        assert_eq!(unescape_twice(&escape_filter_value(path)), path);
    }
}
