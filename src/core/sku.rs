use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// 每個 part 之間可以使用的分隔符號
const SEPARATORS: [&str; 3] = ["", " ", "-"];

/// Above this many parts only the uniform renderings are produced, since the
/// full expansion grows as `3^(parts - 1)`.
pub const MAX_SKU_PARTS: usize = 8;

static PART_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("SKU boundary pattern is valid"));

/// Split on runs of whitespace or hyphens. A leading or trailing hyphen leaves
/// an empty edge part, so "-A-" renders as " A ", "A", "-A-" and so on.
pub fn sku_parts(sku: &str) -> Vec<&str> {
    PART_BOUNDARY.split(sku).collect()
}

/// Every rendering of `sku` obtainable by re-joining its parts with "", " " or "-".
/// The trimmed input is always part of the result.
pub fn sku_variants(sku: &str) -> BTreeSet<String> {
    let trimmed = sku.trim();
    let parts = sku_parts(trimmed);
    let mut variants = BTreeSet::new();

    if parts.len() > MAX_SKU_PARTS {
        tracing::debug!(
            "SKU {:?} has {} parts, limiting to uniform separators",
            trimmed,
            parts.len()
        );
        for sep in SEPARATORS {
            variants.insert(parts.join(sep));
        }
    } else if let Some((first, rest)) = parts.split_first() {
        let mut partial = vec![first.to_string()];
        for part in rest {
            partial = partial
                .iter()
                .flat_map(|prefix| SEPARATORS.iter().map(move |sep| format!("{prefix}{sep}{part}")))
                .collect();
        }
        variants.extend(partial);
    }

    variants.insert(trimmed.to_string());
    variants
}
