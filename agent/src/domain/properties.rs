//! Java-style properties rendering for the broker config file.

use std::collections::BTreeMap;

/// Broker configuration as supplied by `Client.Start`.
///
/// Ordered so the rendered file is deterministic.
pub type ConfigMapping = BTreeMap<String, String>;

/// Render one `key=value\n` line per entry, keys ascending.
///
/// No escaping and no comments: values are written verbatim.
#[must_use]
pub fn render_properties(config: &ConfigMapping) -> String {
    let mut out = String::new();
    for (key, value) in config {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}
