//! Property-based tests for refspec parsing.

#[cfg(test)]
mod proptest_tests {
    use crate::refspec::{validate_ref_name, ParsedRefspec};
    use proptest::prelude::*;

    /// Branch names git accepts: short lowercase components joined by '/'.
    fn branch_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,8}(/[a-z][a-z0-9_-]{0,8}){0,2}"
    }

    proptest! {
        /// Property: parse never panics, whatever the input
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = ParsedRefspec::parse(&input);
        }

        /// Property: a parsed refspec prints back to a string that parses to
        /// the same value
        #[test]
        fn display_reparses_to_same_value(
            force in any::<bool>(),
            source in branch_name(),
            destination in proptest::option::of(branch_name()),
        ) {
            let mut spec = String::new();
            if force {
                spec.push('+');
            }
            spec.push_str(&source);
            if let Some(destination) = &destination {
                spec.push(':');
                spec.push_str(destination);
            }

            let parsed = ParsedRefspec::parse(&spec).unwrap();
            prop_assert_eq!(parsed.to_string(), spec);
            prop_assert_eq!(ParsedRefspec::parse(&parsed.to_string()).unwrap(), parsed.clone());
            prop_assert_eq!(parsed.force, force);
            prop_assert_eq!(
                parsed.destination_branch(),
                destination.as_deref().unwrap_or(&source)
            );
        }

        /// Property: any name containing '..' is rejected
        #[test]
        fn double_dot_is_rejected(left in branch_name(), right in branch_name()) {
            let name = format!("{}..{}", left, right);
            prop_assert!(validate_ref_name(&name).is_err());
            prop_assert!(ParsedRefspec::parse(&name).is_err());
        }

        /// Property: names with a leading '-' are rejected on either side
        #[test]
        fn leading_dash_is_rejected(name in branch_name(), other in branch_name()) {
            let dashed = format!("-{}", name);
            prop_assert!(validate_ref_name(&dashed).is_err());
            let as_destination = format!("{}:{}", other, dashed);
            prop_assert!(ParsedRefspec::parse(&as_destination).is_err());
        }

        /// Property: shell metacharacters never survive validation
        #[test]
        fn shell_metacharacters_are_rejected(
            name in branch_name(),
            c in prop::sample::select(vec![';', '&', '|', '$', '`', '<', '>']),
        ) {
            let bad = format!("{}{}x", name, c);
            prop_assert!(validate_ref_name(&bad).is_err());
        }
    }
}
