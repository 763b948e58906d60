/// Maps internal primary keys into the provider's external id namespace and
/// back. The provider requires a stable alphanumeric prefix so our ids never
/// collide with other consignees on a shared warehouse floor.
#[derive(Debug, Clone)]
pub struct ExternalIdMapper {
    prefix: String,
}

const NAMESPACE: &str = "GFL";

impl ExternalIdMapper {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn to_external(&self, internal_id: i64) -> String {
        format!("{}{}{}", NAMESPACE, self.prefix, internal_id)
    }

    /// Inverse of [`to_external`]. Returns `None` for ids from a foreign
    /// namespace or with a non-numeric tail.
    ///
    /// [`to_external`]: Self::to_external
    pub fn from_external(&self, external_id: &str) -> Option<i64> {
        let tail = external_id.strip_prefix(NAMESPACE)?;
        let tail = tail.strip_prefix(self.prefix.as_str())?;
        tail.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(42)]
    #[case(999_983)]
    #[case(i64::MAX)]
    fn round_trips_exactly(#[case] id: i64) {
        let mapper = ExternalIdMapper::new("7");
        assert_eq!(mapper.from_external(&mapper.to_external(id)), Some(id));
    }

    #[test]
    fn rejects_foreign_namespace() {
        let mapper = ExternalIdMapper::new("7");
        assert_eq!(mapper.from_external("NKS712"), None);
        assert_eq!(mapper.from_external("GFL7abc"), None);
        assert_eq!(mapper.from_external(""), None);
    }

    #[test]
    fn prefix_is_part_of_the_namespace() {
        let with_prefix = ExternalIdMapper::new("9");
        let without = ExternalIdMapper::new("");
        assert_eq!(with_prefix.to_external(5), "GFL95");
        assert_eq!(without.to_external(5), "GFL5");
        // a prefixed mapper must not accept an unprefixed id that would
        // alias a different record
        assert_eq!(with_prefix.from_external("GFL5"), None);
    }
}
