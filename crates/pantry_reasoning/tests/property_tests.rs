//! Property-based tests for the action parser.
//!
//! Model output is arbitrary text, so parsing must never panic and must keep
//! its normalization guarantees for any input.

use pantry_reasoning::{parse_action, split_turn};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// **Never panics** on arbitrary Unicode input.
    #[test]
    fn parse_action_never_panics(s in "\\PC{0,300}") {
        let _ = parse_action(&s);
        let _ = parse_action(&format!("Action: {s}"));
    }

    /// The normalized action always carries the `Action:` marker.
    #[test]
    fn split_turn_action_is_prefixed(s in "\\PC{0,300}") {
        let turn = split_turn(&s);
        prop_assert!(turn.action.starts_with("Action:"));
        prop_assert_eq!(turn.missing_action, !s.contains("Action:"));
    }

    /// Any double-quoted answer without quotes or backslashes comes back intact.
    #[test]
    fn finish_answer_round_trips(answer in "[^\"\\\\\\n]{0,60}") {
        let text = format!("Action: finish[answer=\"{answer}\"]");
        let action = parse_action(&text);
        prop_assert!(action.is_some(), "failed to parse {:?}", text);
        let action = action.unwrap();
        prop_assert_eq!(action.name, "finish");
        prop_assert_eq!(action.args["answer"].as_str(), Some(answer.as_str()));
    }

    /// Search actions with any identifier-like query and small k parse.
    #[test]
    fn search_with_k_parses(query in "[a-z ]{1,30}", k in 0i64..50) {
        let text = format!("Action: search[query=\"{query}\", k={k}]");
        let action = parse_action(&text).unwrap();
        prop_assert_eq!(action.name, "search");
        prop_assert_eq!(action.args["k"].as_i64(), Some(k));
    }
}
