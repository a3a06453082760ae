//! Label resolution over an append-only label log.
//!
//! Every `add_label` appends an entry, so the log keeps the full history of a
//! label. The current state of a label key is the most recently appended entry
//! for that key.

use indexmap::IndexMap;

use crate::annotation::LabelAnnotation;

/// Resolve the latest entry per label key.
///
/// The result is ordered most recently changed label first.
pub fn resolve_labels(log: &[LabelAnnotation]) -> IndexMap<&str, &LabelAnnotation> {
    let mut resolved = IndexMap::new();
    for label in log.iter().rev() {
        resolved.entry(label.label()).or_insert(label);
    }
    resolved
}

/// Resolved labels, optionally filtered by their active flag
pub fn filter_labels(log: &[LabelAnnotation], active: Option<bool>) -> Vec<&LabelAnnotation> {
    resolve_labels(log)
        .into_values()
        .filter(|label| active.map_or(true, |a| label.is_active() == a))
        .collect()
}

/// Name → value view of the active resolved labels
pub fn label_values(log: &[LabelAnnotation]) -> IndexMap<String, String> {
    filter_labels(log, Some(true))
        .into_iter()
        .map(|label| (label.label().to_string(), label.value().to_string()))
        .collect()
}

/// Append each incoming label that is newer than the resolved entry of its key
/// in `log` and changes its state. Keys missing from `log` are always taken.
/// Returns the number of entries appended.
pub fn merge_labels<'a, I>(log: &mut Vec<LabelAnnotation>, incoming: I) -> usize
where
    I: IntoIterator<Item = &'a LabelAnnotation>,
{
    let mut appended = 0;
    for label in incoming {
        let keep_current = log
            .iter()
            .rev()
            .find(|current| current.label() == label.label())
            .is_some_and(|current| {
                current.created() >= label.created() || current.same_state(label)
            });
        if !keep_current {
            log.push(label.clone());
            appended += 1;
        }
    }
    appended
}
