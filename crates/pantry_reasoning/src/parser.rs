//! Parse `Thought:` / `Action:` turns from plain-text model output.
//!
//! The action syntax is `Action: name[key="value", key='value', key=bare]`.
//! Brackets are optional for argument-less actions and trailing punctuation
//! after the closing bracket is ignored. Anything else is a parse failure,
//! reported as `None`; deciding what to do about it is the caller's job.

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;

static RE_THOUGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Thought:\s*(.*)").unwrap());
static RE_ACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Action:\s*(.*)").unwrap());
static RE_ACTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Action\s*:\s*(.*)$").unwrap());
static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(.*)$").unwrap());

pub const ACTION_MARKER: &str = "Action:";
pub const NO_THOUGHT: &str = "(no thought)";
/// Substituted when the model output has no action line at all.
pub const FALLBACK_ACTION: &str = r#"finish[answer="(no action)"]"#;

/// An action name plus its loosely-typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAction {
    pub name: String,
    pub args: Map<String, Value>,
}

impl ParsedAction {
    /// Argument rendered as text: strings verbatim, other scalars via their JSON form.
    pub fn arg_text(&self, key: &str) -> Option<String> {
        match self.args.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// The thought and normalized action line extracted from one model turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub thought: String,
    /// Always starts with `Action:`.
    pub action: String,
    /// True when no action line was found and [`FALLBACK_ACTION`] was used.
    pub missing_action: bool,
}

/// Pull the first `Thought:` and `Action:` out of raw model output.
pub fn split_turn(output: &str) -> Turn {
    let thought = RE_THOUGHT
        .captures(output)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| NO_THOUGHT.to_string());
    let (action_text, missing_action) = match RE_ACTION.captures(output) {
        Some(c) => (c[1].trim().to_string(), false),
        None => (FALLBACK_ACTION.to_string(), true),
    };
    let action = if action_text.starts_with(ACTION_MARKER) {
        action_text
    } else {
        format!("{ACTION_MARKER} {action_text}")
    };
    Turn {
        thought,
        action,
        missing_action,
    }
}

/// Parse the first line starting with `Action:` into a name and arguments.
pub fn parse_action(text: &str) -> Option<ParsedAction> {
    let caps = RE_ACTION_LINE.captures(text)?;
    let rest = caps[1].trim().trim_start_matches('`');
    let name_caps = RE_NAME.captures(rest)?;
    let name = name_caps[1].to_string();
    let tail = name_caps[2].trim();

    let args = match tail.strip_prefix('[') {
        Some(bracketed) => {
            let close = bracketed.rfind(']')?;
            if !is_trailing_noise(&bracketed[close + 1..]) {
                return None;
            }
            parse_arguments(&bracketed[..close])?
        }
        None if is_trailing_noise(tail) => Map::new(),
        None => return None,
    };
    Some(ParsedAction { name, args })
}

fn is_trailing_noise(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() || c.is_ascii_punctuation())
}

/// `key="v", key='v', key=bare` with an optional trailing comma.
fn parse_arguments(inner: &str) -> Option<Map<String, Value>> {
    let mut args = Map::new();
    let mut chars = inner.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                key.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if key.is_empty() {
            return None;
        }

        skip_whitespace(&mut chars);
        if chars.next() != Some('=') {
            return None;
        }
        skip_whitespace(&mut chars);

        let value = match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                Value::String(read_quoted(&mut chars, quote)?)
            }
            _ => {
                let mut raw = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    raw.push(c);
                    chars.next();
                }
                let raw = raw.trim();
                if raw.is_empty() {
                    return None;
                }
                bare_value(raw)
            }
        };

        skip_whitespace(&mut chars);
        match chars.next() {
            None | Some(',') => {}
            Some(_) => return None,
        }
        args.insert(key, value);
    }

    Some(args)
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

/// Read up to the closing `quote`. `\<quote>` and `\\` are unescaped; other
/// backslashes are kept as written. `None` if the quote never closes.
fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> Option<String> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(next) if next == quote || next == '\\' => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            c if c == quote => return Some(out),
            c => out.push(c),
        }
    }
    None
}

fn bare_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_finish() {
        let action = parse_action(r#"Action: finish[answer="Pasta Bake"]"#).unwrap();
        assert_eq!(action.name, "finish");
        assert_eq!(action.args["answer"], "Pasta Bake");
    }

    #[test]
    fn test_parse_search_with_k() {
        let action = parse_action(r#"Action: search[query="chicken rice", k=5]"#).unwrap();
        assert_eq!(action.name, "search");
        assert_eq!(action.args["query"], "chicken rice");
        assert_eq!(action.args["k"], json!(5));
    }

    #[test]
    fn test_single_quoted_and_bare_values() {
        let action = parse_action("Action: search[query='apple pie', k=2]").unwrap();
        assert_eq!(action.args["query"], "apple pie");

        let action = parse_action("Action: search[query=eggs, k=1.5, exact=true]").unwrap();
        assert_eq!(action.args["query"], "eggs");
        assert_eq!(action.args["k"], json!(1.5));
        assert_eq!(action.args["exact"], json!(true));
    }

    #[test]
    fn test_quoted_numbers_stay_strings() {
        let action = parse_action(r#"Action: search[query="30", k="3"]"#).unwrap();
        assert_eq!(action.args["query"], json!("30"));
        assert_eq!(action.args["k"], json!("3"));
    }

    #[test]
    fn test_commas_and_brackets_inside_quotes() {
        let action =
            parse_action(r#"Action: finish[answer="Rice, beans [optional], and salsa"]"#).unwrap();
        assert_eq!(action.args["answer"], "Rice, beans [optional], and salsa");
    }

    #[test]
    fn test_escaped_quote() {
        let action = parse_action(r#"Action: finish[answer="the \"best\" cake"]"#).unwrap();
        assert_eq!(action.args["answer"], r#"the "best" cake"#);
    }

    #[test]
    fn test_no_arguments() {
        let action = parse_action("Action: finish").unwrap();
        assert_eq!(action.name, "finish");
        assert!(action.args.is_empty());

        let action = parse_action("Action: finish[]").unwrap();
        assert!(action.args.is_empty());
    }

    #[test]
    fn test_whitespace_and_trailing_punctuation() {
        let action = parse_action(r#"  Action:   search [ query = "eggs" ,  k = 2 ] .  "#).unwrap();
        assert_eq!(action.name, "search");
        assert_eq!(action.args["query"], "eggs");
        assert_eq!(action.args["k"], json!(2));

        assert!(parse_action("Action: finish.").is_some());
        assert!(parse_action(r#"Action: `search[query="x"]`"#).is_some());
    }

    #[test]
    fn test_marker_found_on_later_line() {
        let text = "Thought: look it up\nAction: search[query=\"soup\"]\n";
        let action = parse_action(text).unwrap();
        assert_eq!(action.args["query"], "soup");
    }

    #[test]
    fn test_trailing_comma_accepted() {
        let action = parse_action(r#"Action: search[query="soup",]"#).unwrap();
        assert_eq!(action.args.len(), 1);
    }

    #[test]
    fn test_malformed_is_none() {
        assert!(parse_action("no marker here").is_none());
        assert!(parse_action("Action:").is_none());
        assert!(parse_action("Action: [query=\"x\"]").is_none());
        assert!(parse_action(r#"Action: search[query="unterminated]"#).is_none());
        assert!(parse_action(r#"Action: search[query="x""#).is_none());
        assert!(parse_action(r#"Action: search[query]"#).is_none());
        assert!(parse_action(r#"Action: search[="x"]"#).is_none());
        assert!(parse_action(r#"Action: search[query=]"#).is_none());
        assert!(parse_action(r#"Action: search[query="a" "b"]"#).is_none());
        assert!(parse_action(r#"Action: search[query="x"] and more"#).is_none());
        assert!(parse_action("Action: search for eggs").is_none());
    }

    #[test]
    fn test_parser_never_invents_finish() {
        assert!(parse_action("Thought: I am done").is_none());
    }

    #[test]
    fn test_split_turn() {
        let turn = split_turn("Thought: need recipes\nAction: search[query=\"eggs\"]");
        assert_eq!(turn.thought, "need recipes");
        assert_eq!(turn.action, r#"Action: search[query="eggs"]"#);
        assert!(!turn.missing_action);
    }

    #[test]
    fn test_split_turn_missing_parts() {
        let turn = split_turn("I think the answer is soup.");
        assert_eq!(turn.thought, "(no thought)");
        assert_eq!(turn.action, r#"Action: finish[answer="(no action)"]"#);
        assert!(turn.missing_action);

        let parsed = parse_action(&turn.action).unwrap();
        assert_eq!(parsed.name, "finish");
        assert_eq!(parsed.arg_text("answer").as_deref(), Some("(no action)"));
    }

    #[test]
    fn test_split_turn_inline_action() {
        // The action marker need not start the line
        let turn = split_turn("Thought: ok. Action: finish[answer=\"Soup\"]");
        assert_eq!(turn.thought, "ok. Action: finish[answer=\"Soup\"]");
        assert_eq!(turn.action, "Action: finish[answer=\"Soup\"]");
    }

    #[test]
    fn test_arg_text() {
        let action = parse_action("Action: finish[answer=42]").unwrap();
        assert_eq!(action.arg_text("answer").as_deref(), Some("42"));
        assert_eq!(action.arg_text("missing"), None);
    }
}
