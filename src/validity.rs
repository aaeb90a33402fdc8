//! Validity verdict for built records
//!
//! Tells a genuinely empty result (e.g. past the last page) apart from a
//! page whose markup no longer matches the mapping.

use crate::extractors::Record;
use crate::mapping::ValidityRule;

/// `true` when the rule's child list is empty, or its first child has a
/// non-empty title field. Without a rule there is nothing to check.
pub fn is_valid(record: &Record, rule: Option<&ValidityRule>) -> bool {
    let Some(rule) = rule else {
        return true;
    };
    first_title_present(
        record
            .children(&rule.children)
            .iter()
            .map(|child| child.string(&rule.title_field)),
    )
}

/// Validity over a sequence of child titles: empty, or first title non-empty
pub fn first_title_present<'a, I>(titles: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    !matches!(titles.into_iter().next(), Some(""))
}
