//! Document writer.

use std::io::{self, Write};

use quick_xml::escape::escape;

use crate::constants::ROOT_ELEMENT;
use crate::set::ConfigSet;

/// Render `set` as a configuration document.
///
/// Keys are written in sorted order, each with its value, its final flag
/// when set, and its full origin history.
pub fn to_document_string(set: &ConfigSet) -> String {
    let mut output = String::new();
    output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    output.push_str(&format!("<{ROOT_ELEMENT}>\n"));

    for (key, entry) in set.raw_entries() {
        output.push_str("  <property>\n");
        output.push_str(&format!("    <name>{}</name>\n", escape(key.as_str())));
        output.push_str(&format!("    <value>{}</value>\n", escape(entry.value.as_str())));
        if entry.is_final {
            output.push_str("    <final>true</final>\n");
        }
        for origin in &entry.origins {
            output.push_str(&format!("    <source>{}</source>\n", escape(origin.as_str())));
        }
        output.push_str("  </property>\n");
    }

    output.push_str(&format!("</{ROOT_ELEMENT}>\n"));
    output
}

/// Write `set` as a configuration document to `writer`.
pub fn write_document<W: Write>(set: &ConfigSet, writer: &mut W) -> io::Result<()> {
    writer.write_all(to_document_string(set).as_bytes())
}
