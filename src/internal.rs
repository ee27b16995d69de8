//! Naming convention for topics owned by a stream-processing application.

const CHANGELOG_SUFFIX: &str = "-changelog";
const REPARTITION_SUFFIX: &str = "-repartition";

/// Returns true if `topic_name` is a changelog or repartition topic of `application_id`.
///
/// Such topics are named `<application_id>-<anything>-changelog` or `<application_id>-<anything>-repartition`.
pub fn is_internal_topic(topic_name: &str, application_id: &str) -> bool {
    topic_name
        .strip_prefix(application_id)
        .is_some_and(|rest| rest.starts_with('-'))
        && (topic_name.ends_with(CHANGELOG_SUFFIX) || topic_name.ends_with(REPARTITION_SUFFIX))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_classification() {
        assert!(is_internal_topic("app1-store-changelog", "app1"));
        assert!(is_internal_topic("app1-store-repartition", "app1"));
        assert!(!is_internal_topic("other-store-changelog", "app1"));
        assert!(!is_internal_topic("app1-store", "app1"));
        assert!(!is_internal_topic("app10-store-changelog", "app1"));
        assert!(!is_internal_topic("app1store-changelog", "app1"));
    }

    proptest! {
        #[test]
        fn test_owned_topics_match(app in "[a-z0-9_]{1,12}", store in "[a-z0-9_-]{0,12}") {
            let changelog = format!("{app}-{store}-changelog");
            let repartition = format!("{app}-{store}-repartition");
            prop_assert!(is_internal_topic(&changelog, &app));
            prop_assert!(is_internal_topic(&repartition, &app));
        }

        #[test]
        fn test_foreign_prefix_never_matches(app in "[a-z]{1,12}", name in "[A-Z0-9][a-z0-9-]{0,24}") {
            prop_assert!(!is_internal_topic(&name, &app));
        }
    }
}
