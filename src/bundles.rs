use tracing::warn;

/// Hard provider limit on the BUNDLE wire field.
pub const BUNDLE_FIELD_LIMIT: usize = 120;

const BUNDLE_SEPARATOR: &str = "|||";

/// One warehouse-bound line after bundle expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedLine {
    pub product_id: i64,
    pub quantity: i32,
}

/// Expands a bundle's constituents for an order line of `outer_quantity`
/// units. Constituents must be passed in declared item order; the result
/// preserves it.
pub fn expand_line(constituents: &[ExpandedLine], outer_quantity: i32) -> Vec<ExpandedLine> {
    constituents
        .iter()
        .map(|c| ExpandedLine {
            product_id: c.product_id,
            quantity: c.quantity * outer_quantity,
        })
        .collect()
}

/// Builds the provider's per-bundle description entry, e.g. `"4|1,5|2"` for
/// a bundle of product 4 once and product 5 twice.
pub fn bundle_entry<'a>(parts: impl IntoIterator<Item = (&'a str, i32)>) -> String {
    parts
        .into_iter()
        .map(|(sku, quantity)| format!("{sku}|{quantity}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Joins bundle entries for the BUNDLE wire field. When the joined string
/// exceeds the provider limit, whole trailing entries are dropped; an entry
/// is never cut mid-way.
pub fn bundle_field(entries: &[String]) -> String {
    let joined = entries.join(BUNDLE_SEPARATOR);
    if joined.len() <= BUNDLE_FIELD_LIMIT {
        return joined;
    }

    warn!(
        length = joined.len(),
        "bundle string exceeds provider limit, dropping trailing entries"
    );

    let mut truncated = String::new();
    for entry in entries {
        if truncated.len() + entry.len() + BUNDLE_SEPARATOR.len() > BUNDLE_FIELD_LIMIT {
            break;
        }
        truncated.push_str(entry);
        truncated.push_str(BUNDLE_SEPARATOR);
    }
    truncated
}
