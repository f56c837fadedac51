//! Name conversions between chain labels and stored field names.

use crate::domain::chain_document::ContentType;

/// Camel-case an underscore-separated content or group label
/// (`time_share_x100` becomes `timeShareX100`).
pub fn camel_case_label(label: &str) -> String {
    camel_join(label.split('_'))
}

/// Camel-case a dotted edge name (`start.period` becomes `startPeriod`).
///
/// Used both when writing an adjacency key and when looking one up, so the
/// two can never disagree.
pub fn edge_field_name(edge_name: &str) -> String {
    camel_join(edge_name.split('.'))
}

/// Convert a chain type name to its object-type form
/// (`dao.user` becomes `DaoUser`).
pub fn object_type_name(type_name: &str) -> String {
    type_name
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect()
}

/// Derive the stored field name for a content:
/// `<groupPrefix>_<camelCaseLabel><typeSuffix>`.
pub fn field_name(prefix: &str, label: &str, content_type: ContentType) -> String {
    format!(
        "{}_{}{}",
        prefix,
        camel_case_label(label),
        content_type.field_suffix()
    )
}

fn camel_join<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for segment in segments.filter(|segment| !segment.is_empty()) {
        if out.is_empty() {
            out.push_str(segment);
        } else {
            out.push_str(&capitalize(segment));
        }
    }
    out
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
