use crate::policy::OverrideRule;

/// Compute the ordered list of columns to transfer for one table.
///
/// Starts from the source column list; an `include` rule restricts it
/// (preserving source order), an `exclude` rule then removes names, and the
/// result is intersected with the target column list, still in source order.
/// Every returned name is therefore a member of both input lists.
///
/// An empty result is a normal outcome and means the table has no common
/// columns to transfer.
pub fn reconcile(
    source_columns: &[String],
    target_columns: &[String],
    rule: Option<&OverrideRule>,
) -> Vec<String> {
    let mut selected: Vec<String> = source_columns.to_vec();

    if let Some(rule) = rule {
        if let Some(include) = rule.include.as_ref() {
            selected.retain(|name| include.contains(name));
        }
        selected.retain(|name| !rule.exclude.contains(name));
    }

    selected.retain(|name| target_columns.contains(name));
    selected
}
