//! Document parser.
//!
//! A pull parser over the document events: comments, declarations and
//! processing instructions are dropped before they reach the grammar below,
//! and inclusion directives are recognised by namespace, not by prefix.

use std::fmt;

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use super::{DocumentOptions, DocumentSource, ParsedProperty};
use crate::constants::{ROOT_ELEMENT, XINCLUDE_NAMESPACE};
use crate::error::{ConfigError, Result};
use crate::fs::{FileSystem, LocalFileSystem, Location, read_fully};

/// Parse a configuration document.
///
/// Properties are returned in document order, with the content of included
/// documents spliced in at the point of inclusion.
pub(crate) fn parse_document(
    bytes: &[u8],
    source: DocumentSource<'_>,
    options: &DocumentOptions,
) -> Result<Vec<ParsedProperty>> {
    parse_at_depth(bytes, source, options, 0)
}

fn parse_at_depth(
    bytes: &[u8],
    source: DocumentSource<'_>,
    options: &DocumentOptions,
    depth: usize,
) -> Result<Vec<ParsedProperty>> {
    let mut parser = Parser {
        reader: NsReader::from_reader(bytes),
        buf: Vec::new(),
        label: source.label(),
        source,
        options,
        depth,
    };
    let mut properties = Vec::new();
    parser.parse_root(&mut properties)?;
    Ok(properties)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tag {
    Configuration,
    Property,
    Include {
        href: Option<String>,
        parse: Option<String>,
    },
    Fallback,
    Other(String),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Configuration => write!(f, "<{ROOT_ELEMENT}>"),
            Tag::Property => f.write_str("<property>"),
            Tag::Include { .. } => f.write_str("<xi:include>"),
            Tag::Fallback => f.write_str("<xi:fallback>"),
            Tag::Other(name) => write!(f, "<{name}>"),
        }
    }
}

enum Node {
    Open(Tag),
    Empty(Tag),
    Close,
    Text(String),
    Eof,
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

struct Parser<'a> {
    reader: NsReader<&'a [u8]>,
    buf: Vec<u8>,
    label: String,
    source: DocumentSource<'a>,
    options: &'a DocumentOptions,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl fmt::Display) -> ConfigError {
        ConfigError::parse(&self.label, message)
    }

    fn next_node(&mut self) -> Result<Node> {
        let Parser {
            reader, buf, label, ..
        } = self;
        loop {
            buf.clear();
            let (ns, event) = reader
                .read_resolved_event_into(buf)
                .map_err(|e| ConfigError::parse(&*label, e))?;
            let node = match event {
                Event::Start(start) => Node::Open(classify(&ns, &start, label)?),
                Event::Empty(start) => Node::Empty(classify(&ns, &start, label)?),
                Event::End(_) => Node::Close,
                Event::Text(text) => Node::Text(
                    text.unescape()
                        .map_err(|e| ConfigError::parse(&*label, e))?
                        .into_owned(),
                ),
                Event::CData(data) => Node::Text(
                    String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| ConfigError::parse(&*label, e))?,
                ),
                Event::Eof => Node::Eof,
                // Comments, declarations, doctypes, processing instructions.
                _ => continue,
            };
            return Ok(node);
        }
    }

    fn parse_root(&mut self, out: &mut Vec<ParsedProperty>) -> Result<()> {
        loop {
            match self.next_node()? {
                Node::Open(Tag::Configuration) => {
                    self.parse_children(out)?;
                    break;
                }
                Node::Empty(Tag::Configuration) => break,
                // Included fragments may consist of a single property.
                Node::Open(Tag::Property) if self.depth > 0 => {
                    self.parse_property(out)?;
                    break;
                }
                Node::Text(text) if is_blank(&text) => {}
                Node::Eof => return Err(self.error("document has no root element")),
                Node::Open(tag) | Node::Empty(tag) => {
                    return Err(self.error(format!(
                        "root element must be <{ROOT_ELEMENT}>, found {tag}"
                    )));
                }
                Node::Text(_) => return Err(self.error("text before root element")),
                Node::Close => return Err(self.error("unexpected closing tag")),
            }
        }

        loop {
            match self.next_node()? {
                Node::Eof => return Ok(()),
                Node::Text(text) if is_blank(&text) => {}
                _ => return Err(self.error("content after root element")),
            }
        }
    }

    /// Parse the children of a `<configuration>` (or `<xi:fallback>`) up to
    /// its closing tag.
    fn parse_children(&mut self, out: &mut Vec<ParsedProperty>) -> Result<()> {
        loop {
            match self.next_node()? {
                Node::Close => return Ok(()),
                Node::Eof => return Err(self.error("unexpected end of document")),
                Node::Open(Tag::Property) => self.parse_property(out)?,
                Node::Empty(Tag::Property) => return Err(self.error("property without <name>")),
                Node::Open(Tag::Configuration) => self.parse_children(out)?,
                Node::Empty(Tag::Configuration) => {}
                Node::Open(Tag::Include { href, parse }) => {
                    let fallback = self.parse_include_body()?;
                    self.include(href, parse, fallback, out)?;
                }
                Node::Empty(Tag::Include { href, parse }) => self.include(href, parse, None, out)?,
                Node::Open(tag) => {
                    tracing::warn!(source = %self.label, element = %tag, "Skipping unexpected element");
                    self.skip_element()?;
                }
                Node::Empty(tag) => {
                    tracing::warn!(source = %self.label, element = %tag, "Skipping unexpected element");
                }
                Node::Text(text) => {
                    if !is_blank(&text) {
                        tracing::warn!(source = %self.label, "Ignoring stray text in document");
                    }
                }
            }
        }
    }

    fn parse_property(&mut self, out: &mut Vec<ParsedProperty>) -> Result<()> {
        let mut fields = PropertyFields::default();
        loop {
            match self.next_node()? {
                Node::Close => break,
                Node::Eof => return Err(self.error("unexpected end of document in <property>")),
                Node::Open(Tag::Other(field)) => {
                    let text = self.read_text()?;
                    fields.apply(&field, text, &self.label);
                }
                Node::Empty(Tag::Other(field)) => fields.apply(&field, String::new(), &self.label),
                Node::Open(tag) => {
                    tracing::warn!(source = %self.label, element = %tag, "Skipping unexpected element in property");
                    self.skip_element()?;
                }
                Node::Empty(tag) => {
                    tracing::warn!(source = %self.label, element = %tag, "Skipping unexpected element in property");
                }
                Node::Text(text) => {
                    if !is_blank(&text) {
                        tracing::warn!(source = %self.label, "Ignoring stray text in property");
                    }
                }
            }
        }

        // Names are kept verbatim, an empty `<name/>` included, so that any
        // key the writer emits reads back unchanged.
        let Some(name) = fields.name else {
            return Err(self.error("property without <name>"));
        };
        match fields.value {
            Some(value) => out.push(ParsedProperty {
                name,
                value,
                is_final: fields.is_final,
                claimed_sources: fields.sources,
            }),
            None => {
                tracing::warn!(source = %self.label, key = %name, "Property has no value; skipping");
            }
        }
        Ok(())
    }

    /// Text content of the current element up to its closing tag. Nested
    /// elements are skipped.
    fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_node()? {
                Node::Close => return Ok(text),
                Node::Text(chunk) => text.push_str(&chunk),
                Node::Eof => return Err(self.error("unexpected end of document")),
                Node::Open(tag) => {
                    tracing::warn!(source = %self.label, element = %tag, "Skipping markup inside text element");
                    self.skip_element()?;
                }
                Node::Empty(_) => {}
            }
        }
    }

    fn skip_element(&mut self) -> Result<()> {
        let mut open = 1usize;
        while open > 0 {
            match self.next_node()? {
                Node::Open(_) => open += 1,
                Node::Close => open -= 1,
                Node::Eof => return Err(self.error("unexpected end of document")),
                Node::Empty(_) | Node::Text(_) => {}
            }
        }
        Ok(())
    }

    /// Read the children of an `<xi:include>`, returning the parsed content
    /// of its `<xi:fallback>` if it has one.
    fn parse_include_body(&mut self) -> Result<Option<Vec<ParsedProperty>>> {
        let mut fallback = None;
        loop {
            match self.next_node()? {
                Node::Close => return Ok(fallback),
                Node::Eof => return Err(self.error("unexpected end of document in include")),
                Node::Open(Tag::Fallback) => {
                    let mut properties = Vec::new();
                    self.parse_children(&mut properties)?;
                    fallback = Some(properties);
                }
                Node::Empty(Tag::Fallback) => fallback = Some(Vec::new()),
                Node::Open(_) => self.skip_element()?,
                Node::Empty(_) | Node::Text(_) => {}
            }
        }
    }

    fn include(
        &mut self,
        href: Option<String>,
        parse: Option<String>,
        fallback: Option<Vec<ParsedProperty>>,
        out: &mut Vec<ParsedProperty>,
    ) -> Result<()> {
        if !self.options.resolve_includes {
            tracing::warn!(source = %self.label, href = ?href, "Include directives disabled; skipping");
            return Ok(());
        }
        if let Some(mode) = parse.filter(|mode| mode != "xml") {
            return Err(self.error(format!("unsupported include parse mode '{mode}'")));
        }
        let href = href.ok_or_else(|| self.error("include directive without href"))?;
        if self.depth + 1 > self.options.max_include_depth {
            return Err(self.error(format!(
                "include of '{href}' exceeds maximum include depth {}",
                self.options.max_include_depth
            )));
        }

        if self.include_target(&href, out)? {
            return Ok(());
        }
        match fallback {
            Some(properties) => {
                tracing::debug!(source = %self.label, href = %href, "Include target missing; using fallback");
                out.extend(properties);
                Ok(())
            }
            None => Err(self.error(format!("included document '{href}' not found"))),
        }
    }

    /// Parse the document `href` refers to into `out`. Returns false if the
    /// target does not exist.
    fn include_target(&self, href: &str, out: &mut Vec<ParsedProperty>) -> Result<bool> {
        let local = LocalFileSystem::new();
        let (fs, target): (&dyn FileSystem, Location) = match self.source {
            DocumentSource::Located { fs, location } => {
                let target = location.resolve(href).map_err(|e| self.error(e))?;
                (fs, target)
            }
            DocumentSource::Detached { .. } => {
                if href.starts_with('/') || href.starts_with("file://") {
                    (&local, Location::new(href))
                } else {
                    return Err(self.error(format!(
                        "include '{href}' cannot be resolved: {} is not an addressable file location",
                        self.label
                    )));
                }
            }
        };

        if !fs.exists(&target).map_err(|e| ConfigError::io(&target, e))? {
            return Ok(false);
        }
        tracing::debug!(source = %self.label, target = %target, "Resolving include");
        let bytes = read_fully(fs, &target)?;
        let nested = parse_at_depth(
            &bytes,
            DocumentSource::Located {
                fs,
                location: &target,
            },
            self.options,
            self.depth + 1,
        )?;
        out.extend(nested);
        Ok(true)
    }
}

#[derive(Default)]
struct PropertyFields {
    name: Option<String>,
    value: Option<String>,
    is_final: bool,
    sources: Vec<String>,
}

impl PropertyFields {
    fn apply(&mut self, field: &str, text: String, label: &str) {
        match field {
            "name" => self.name = Some(text),
            "value" => self.value = Some(text),
            "final" => self.is_final = text.trim() == "true",
            "source" => self.sources.push(text),
            "description" => {}
            other => {
                tracing::warn!(source = %label, element = %other, "Ignoring unknown property field");
            }
        }
    }
}

fn classify(ns: &ResolveResult<'_>, start: &BytesStart<'_>, label: &str) -> Result<Tag> {
    let local_name = start.local_name();
    let local = std::str::from_utf8(local_name.as_ref()).map_err(|e| ConfigError::parse(label, e))?;
    let in_xinclude = matches!(
        ns,
        ResolveResult::Bound(Namespace(uri)) if *uri == XINCLUDE_NAMESPACE.as_bytes()
    );

    let tag = match (in_xinclude, local) {
        (true, "include") => Tag::Include {
            href: attribute(start, "href", label)?,
            parse: attribute(start, "parse", label)?,
        },
        (true, "fallback") => Tag::Fallback,
        (false, ROOT_ELEMENT) => Tag::Configuration,
        (false, "property") => Tag::Property,
        (_, other) => Tag::Other(other.to_string()),
    };
    Ok(tag)
}

fn attribute(start: &BytesStart<'_>, name: &str, label: &str) -> Result<Option<String>> {
    match start.try_get_attribute(name) {
        Ok(Some(attr)) => attr
            .unescape_value()
            .map(|value| Some(value.into_owned()))
            .map_err(|e| ConfigError::parse(label, e)),
        Ok(None) => Ok(None),
        Err(e) => Err(ConfigError::parse(label, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn parse_detached(xml: &str) -> Result<Vec<ParsedProperty>> {
        parse_document(
            xml.as_bytes(),
            DocumentSource::Detached { label: "test.xml" },
            &DocumentOptions::default(),
        )
    }

    fn parse_located(fs: &MemoryFileSystem, path: &str) -> Result<Vec<ParsedProperty>> {
        let location = Location::new(path);
        let bytes = fs.contents(location.clone()).unwrap();
        parse_document(
            &bytes,
            DocumentSource::Located {
                fs,
                location: &location,
            },
            &DocumentOptions::default(),
        )
    }

    fn names(properties: &[ParsedProperty]) -> Vec<(&str, &str)> {
        properties
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }

    #[test]
    fn test_parses_properties_and_ignores_comments() {
        let properties = parse_detached(
            r#"<?xml version="1.0"?>
            <!-- leading comment -->
            <configuration>
              <!-- a comment between properties -->
              <property>
                <name>a.key</name>
                <value>one<!-- inline -->two</value>
                <final>true</final>
                <source>claimed.xml</source>
                <description>ignored</description>
              </property>
              <property><name>b</name><value/></property>
            </configuration>"#,
        )
        .unwrap();

        assert_eq!(names(&properties), vec![("a.key", "onetwo"), ("b", "")]);
        assert!(properties[0].is_final);
        assert_eq!(properties[0].claimed_sources, vec!["claimed.xml"]);
        assert!(!properties[1].is_final);
    }

    #[test]
    fn test_names_are_kept_verbatim() {
        let properties = parse_detached(
            "<configuration>\
               <property><name> padded </name><value>1</value></property>\
               <property><name></name><value>2</value></property>\
               <property><name/><value>3</value></property>\
             </configuration>",
        )
        .unwrap();
        assert_eq!(names(&properties), vec![(" padded ", "1"), ("", "2"), ("", "3")]);
    }

    #[test]
    fn test_unescapes_entities_and_cdata() {
        let properties = parse_detached(
            "<configuration><property><name>k</name>\
             <value>a &lt; b &amp;&amp; <![CDATA[<raw>]]></value></property></configuration>",
        )
        .unwrap();
        assert_eq!(properties[0].value, "a < b && <raw>");
    }

    #[test]
    fn test_property_without_value_is_skipped() {
        let properties = parse_detached(
            "<configuration><property><name>k</name></property></configuration>",
        )
        .unwrap();
        assert!(properties.is_empty());
    }

    #[test]
    fn test_property_without_name_is_an_error() {
        let err = parse_detached(
            "<configuration><property><value>v</value></property></configuration>",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("without <name>"));
    }

    #[test]
    fn test_malformed_documents_fail() {
        for xml in [
            "",
            "<configuration><property>",
            "<configuration></property>",
            "<settings/>",
            "<configuration/><configuration/>",
        ] {
            let result = parse_detached(xml);
            assert!(
                matches!(result, Err(ConfigError::Parse { .. })),
                "expected parse error for {xml:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_nested_configuration_is_flattened() {
        let properties = parse_detached(
            "<configuration><configuration><property><name>inner</name><value>1</value>\
             </property></configuration><unknown><x/></unknown></configuration>",
        )
        .unwrap();
        assert_eq!(names(&properties), vec![("inner", "1")]);
    }

    #[test]
    fn test_relative_include_resolves_against_location() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/deploy/conf/site.xml",
            r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                 <property><name>a</name><value>1</value></property>
                 <xi:include href="fragments/net.xml"/>
                 <property><name>c</name><value>3</value></property>
               </configuration>"#,
        );
        fs.insert(
            "/deploy/conf/fragments/net.xml",
            "<configuration><property><name>b</name><value>2</value></property></configuration>",
        );

        let properties = parse_located(&fs, "/deploy/conf/site.xml").unwrap();
        assert_eq!(names(&properties), vec![("a", "1"), ("b", "2"), ("c", "3")]);
    }

    #[test]
    fn test_include_recognised_by_namespace_not_prefix() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/conf/site.xml",
            r#"<configuration xmlns:inc="http://www.w3.org/2001/XInclude">
                 <inc:include href="part.xml"/>
                 <xi:include xmlns:xi="urn:not-xinclude" href="part.xml"/>
               </configuration>"#,
        );
        fs.insert(
            "/conf/part.xml",
            "<property><name>p</name><value>v</value></property>",
        );

        let properties = parse_located(&fs, "/conf/site.xml").unwrap();
        assert_eq!(names(&properties), vec![("p", "v")]);
    }

    #[test]
    fn test_missing_include_uses_fallback() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/conf/site.xml",
            r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                 <xi:include href="absent.xml">
                   <xi:fallback>
                     <property><name>fb</name><value>yes</value></property>
                   </xi:fallback>
                 </xi:include>
               </configuration>"#,
        );

        let properties = parse_located(&fs, "/conf/site.xml").unwrap();
        assert_eq!(names(&properties), vec![("fb", "yes")]);
    }

    #[test]
    fn test_missing_include_without_fallback_fails() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/conf/site.xml",
            r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                 <xi:include href="absent.xml"/>
               </configuration>"#,
        );

        let err = parse_located(&fs, "/conf/site.xml").unwrap_err();
        assert!(err.to_string().contains("absent.xml"));
    }

    #[test]
    fn test_include_cycle_hits_depth_limit() {
        let fs = MemoryFileSystem::new();
        fs.insert(
            "/conf/loop.xml",
            r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                 <xi:include href="loop.xml"/>
               </configuration>"#,
        );

        let err = parse_located(&fs, "/conf/loop.xml").unwrap_err();
        assert!(err.to_string().contains("maximum include depth"));
    }

    #[test]
    fn test_relative_include_unsupported_for_detached_source() {
        let err = parse_detached(
            r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                 <xi:include href="part.xml"/>
               </configuration>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("not an addressable file location"));
    }

    #[test]
    fn test_text_include_mode_rejected() {
        let err = parse_detached(
            r#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                 <xi:include href="/etc/motd" parse="text"/>
               </configuration>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("parse mode"));
    }

    #[test]
    fn test_includes_can_be_disabled() {
        let properties = parse_document(
            br#"<configuration xmlns:xi="http://www.w3.org/2001/XInclude">
                  <xi:include href="part.xml"/>
                  <property><name>a</name><value>1</value></property>
                </configuration>"#,
            DocumentSource::Detached { label: "test.xml" },
            &DocumentOptions {
                resolve_includes: false,
                ..DocumentOptions::default()
            },
        )
        .unwrap();
        assert_eq!(names(&properties), vec![("a", "1")]);
    }
}
