//! Lowercase alphanumeric tokenizer.
//!
//! A token is a maximal run of ASCII letters, digits and apostrophes taken
//! from the lowercased input. Every other character separates tokens.

/// Lazy token stream over one input string.
#[derive(Debug, Clone)]
pub struct Tokens {
    lowered: String,
    pos: usize,
}

impl Tokens {
    pub fn new(text: &str) -> Self {
        Self {
            lowered: text.to_lowercase(),
            pos: 0,
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '\''
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let rest = &self.lowered[self.pos..];
        let start = rest.find(is_token_char)?;
        let tail = &rest[start..];
        // Token chars are single-byte, so the first non-token char bounds the run.
        let len = tail.find(|c: char| !is_token_char(c)).unwrap_or(tail.len());
        self.pos += start + len;
        Some(tail[..len].to_string())
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    Tokens::new(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_folds_and_strips_punctuation() {
        assert_eq!(
            tokenize("Chicken & Rice, 30 min!"),
            vec!["chicken", "rice", "30", "min"]
        );
    }

    #[test]
    fn test_apostrophe_is_token_internal() {
        assert_eq!(tokenize("Grandma's pie"), vec!["grandma's", "pie"]);
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("&&& -- !!").is_empty());
    }

    #[test]
    fn test_non_ascii_separates() {
        assert_eq!(tokenize("crème brûlée"), vec!["cr", "me", "br", "l", "e"]);
        assert_eq!(tokenize("日本 tofu"), vec!["tofu"]);
    }

    #[test]
    fn test_lazy_iteration() {
        let mut tokens = Tokens::new("one two three");
        assert_eq!(tokens.next().as_deref(), Some("one"));
        assert_eq!(tokens.next().as_deref(), Some("two"));
        assert_eq!(tokens.next().as_deref(), Some("three"));
        assert_eq!(tokens.next(), None);
        assert_eq!(tokens.next(), None);
    }
}
