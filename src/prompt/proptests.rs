//! Property-based tests for prompt composition
//!
//! - Every prior turn appears, in order, followed by the new prompt
//! - Empty result sets leave the results section empty
//! - Composition is deterministic

use super::{compose, render_history, CONDITION};
use crate::history::{Role, Turn};
use crate::search::SearchResult;
use proptest::prelude::*;

fn arb_turn() -> impl Strategy<Value = Turn> {
    (
        prop_oneof![Just(Role::User), Just(Role::Agent)],
        "[a-zA-Z0-9 _.!?,]{0,60}",
    )
        .prop_map(|(role, text)| Turn::new(role, text))
}

fn arb_result() -> impl Strategy<Value = SearchResult> {
    (
        "[a-zA-Z0-9 ]{1,30}",
        "https://[a-z]{3,10}\\.com/[a-z0-9]{0,10}",
        "[a-zA-Z0-9 _.!?,]{0,80}",
    )
        .prop_map(|(title, link, snippet)| SearchResult::new(title, link, snippet))
}

proptest! {
    #[test]
    fn transcript_and_prompt_are_included_in_order(
        turns in prop::collection::vec(arb_turn(), 0..8),
        prompt in "[a-zA-Z0-9 _.!?,]{1,60}",
    ) {
        let composed = compose(&turns, &prompt, &[]);

        let mut cursor = 0;
        for turn in &turns {
            let line = turn.to_string();
            let found = composed.get(cursor..).and_then(|rest| rest.find(&line));
            prop_assert!(found.is_some(), "missing turn {:?}", line);
            cursor += found.unwrap() + line.len();
        }

        let prompt_section = format!("User's new prompt: {prompt}\n\n");
        let prompt_at = composed.find(&prompt_section);
        prop_assert!(prompt_at.is_some());
        prop_assert!(prompt_at.unwrap() >= render_history(&turns).len());

        let empty_results = format!("Search results: \n\n{CONDITION}");
        prop_assert!(composed.ends_with(&empty_results));
    }

    #[test]
    fn composition_is_deterministic(
        turns in prop::collection::vec(arb_turn(), 0..6),
        prompt in "[a-zA-Z0-9 ?]{0,40}",
        results in prop::collection::vec(arb_result(), 0..=3),
    ) {
        prop_assert_eq!(
            compose(&turns, &prompt, &results),
            compose(&turns, &prompt, &results)
        );
    }

    #[test]
    fn every_result_snippet_is_numbered(
        results in prop::collection::vec(arb_result(), 1..=3),
    ) {
        let composed = compose(&[], "q", &results);
        for (i, result) in results.iter().enumerate() {
            let expected = format!("RESULT NUMBER {i}: TITLE: {}; LINK: {}; SNIPPET: {}", result.title, result.link, result.snippet);
            prop_assert!(composed.contains(&expected));
        }
        prop_assert!(composed.ends_with(CONDITION));
    }
}
