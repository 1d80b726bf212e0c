//! Layout resources compiled into the binary.

/// Identifiers of every bundled layout, with their JSON source.
pub const AVAILABLE: &[(&str, &str)] = &[("us", include_str!("../../layouts/us.json"))];

/// Returns the JSON source for `layout`, if bundled.
pub fn resource(layout: &str) -> Option<&'static str> {
    AVAILABLE
        .iter()
        .find(|(name, _)| *name == layout)
        .map(|(_, text)| *text)
}
