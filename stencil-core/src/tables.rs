//! Static selection tables.
//!
//! Template selection is purely structural: the lookup key is a
//! [`KeyPath::template_key`](crate::types::KeyPath::template_key) — key names
//! only, list markers and indices erased. A missing entry means "no template
//! for this path" and is not an error.

use crate::types::Kind;

/// Structural key-path → template filename.
const TEMPLATE_TABLE: &[(&str, &str)] = &[
    ("product", "product.yaml"),
    ("assets", "asset.yaml"),
    ("assets.accessControlList", "access-control-list.yaml"),
    ("assets.services", "asset-mapping.yaml"),
    ("assets.activate", "release-tag-asset.yaml"),
    ("product.activate", "release-tag-product.yaml"),
    ("product.plans", "product-plan.yaml"),
    ("product.plans.quotas", "quota.yaml"),
    ("product.activate.marketplace", "published-product.yaml"),
];

/// Single key name → logical kind, for parent-lookup helpers that cannot read
/// the kind off a loaded template.
const KIND_TABLE: &[(&str, Kind)] = &[
    ("product", Kind::Product),
    ("assets", Kind::Asset),
    ("accessControlList", Kind::AccessControlList),
    ("services", Kind::AssetMapping),
    ("activate", Kind::ReleaseTag),
    ("plans", Kind::ProductPlan),
    ("quotas", Kind::Quota),
    ("marketplace", Kind::PublishedProduct),
];

/// The template filename registered for a structural key-path, if any.
pub fn template_for(template_key: &str) -> Option<&'static str> {
    TEMPLATE_TABLE
        .iter()
        .find(|(key, _)| *key == template_key)
        .map(|(_, file)| *file)
}

/// The logical kind associated with a single key name, if any.
pub fn kind_for_key(key: &str) -> Option<Kind> {
    KIND_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("product", Some("product.yaml"))]
    #[case("assets", Some("asset.yaml"))]
    #[case("assets.services", Some("asset-mapping.yaml"))]
    #[case("assets.accessControlList", Some("access-control-list.yaml"))]
    #[case("product.plans.quotas", Some("quota.yaml"))]
    #[case("product.activate.marketplace", Some("published-product.yaml"))]
    #[case("product.assets", None)]
    #[case("", None)]
    fn template_selection(#[case] key: &str, #[case] expected: Option<&str>) {
        assert_eq!(template_for(key), expected);
    }

    #[rstest]
    #[case("services", Some(Kind::AssetMapping))]
    #[case("activate", Some(Kind::ReleaseTag))]
    #[case("marketplace", Some(Kind::PublishedProduct))]
    #[case("releaseState", None)]
    fn kind_lookup(#[case] key: &str, #[case] expected: Option<Kind>) {
        assert_eq!(kind_for_key(key), expected);
    }

    #[test]
    fn selection_ignores_indices() {
        use crate::types::KeyPath;
        let path = KeyPath::from("assets.[].services.[]");
        assert_eq!(template_for(&path.template_key()), Some("asset-mapping.yaml"));
    }
}
