//! Wire codec for the logistics provider's fixed-shape JSON API: outbound
//! envelope construction and inbound notice decoding. No side effects.

pub mod inbound;
pub mod outbound;

pub use inbound::{InboundNotice, WireCodec};

/// The provider rejects quote characters anywhere in values sent to it.
pub fn strip_quotes(value: &str) -> String {
    value.replace('"', "")
}

/// Quote-stripping passthrough for optional source fields; absent values
/// become empty wire strings.
pub fn strip_quotes_opt(value: Option<&str>) -> String {
    value.map(strip_quotes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_are_removed_everywhere() {
        assert_eq!(strip_quotes(r#"product "8" name"#), "product 8 name");
        assert_eq!(strip_quotes("no quotes"), "no quotes");
    }

    #[test]
    fn optional_values_default_to_empty() {
        assert_eq!(strip_quotes_opt(None), "");
        assert_eq!(strip_quotes_opt(Some(r#"a"b"#)), "ab");
    }
}
