//! Property-based tests for credentials-file parsing
//!
//! Renders randomized profile files and checks that parsing recovers every
//! complete profile with its key material intact, independent of ordering,
//! spacing, and optional session tokens.

use awsfind::aws::credentials::parse_profiles;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Profile names are unique by construction (map keys).
fn arb_profiles() -> impl Strategy<Value = BTreeMap<String, (String, String, Option<String>)>> {
    prop::collection::btree_map(
        "[a-z][a-z0-9-]{0,15}",
        (
            "AKIA[A-Z0-9]{12}",
            "[A-Za-z0-9/+]{20,40}",
            prop::option::of("[A-Za-z0-9/+=]{16,32}"),
        ),
        0..8,
    )
}

fn render(profiles: &BTreeMap<String, (String, String, Option<String>)>, spaced: bool) -> String {
    let eq = if spaced { " = " } else { "=" };
    let mut out = String::from("# generated for tests\n");
    for (name, (key, secret, token)) in profiles {
        out.push_str(&format!("[{name}]\n"));
        out.push_str(&format!("aws_access_key_id{eq}{key}\n"));
        out.push_str(&format!("aws_secret_access_key{eq}{secret}\n"));
        if let Some(token) = token {
            out.push_str(&format!("aws_session_token{eq}{token}\n"));
        }
        out.push('\n');
    }
    out
}

proptest! {
    #[test]
    fn parsing_recovers_every_rendered_profile(profiles in arb_profiles(), spaced in any::<bool>()) {
        let contents = render(&profiles, spaced);
        let parsed = parse_profiles(&contents);

        prop_assert_eq!(parsed.len(), profiles.len());
        for credential in &parsed {
            let (key, secret, token) = &profiles[&credential.name];
            prop_assert_eq!(&credential.access_key_id, key);
            prop_assert_eq!(&credential.secret_access_key, secret);
            prop_assert_eq!(&credential.session_token, token);
        }
    }

    #[test]
    fn parsing_never_panics_on_arbitrary_input(contents in ".{0,512}") {
        let _ = parse_profiles(&contents);
    }

    #[test]
    fn parsed_profiles_are_a_subset_of_sections(profiles in arb_profiles()) {
        let contents = render(&profiles, true);
        for credential in parse_profiles(&contents) {
            prop_assert!(profiles.contains_key(&credential.name));
        }
    }
}
