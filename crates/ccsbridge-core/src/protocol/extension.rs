//! `gcm` extension block codec.
//!
//! Wire form: `<gcm xmlns='google:mobile:data'>{xml-escaped json}</gcm>`.
//! The XML form is rendered once when the block is built; the block is an
//! immutable value.

use crate::error::{BridgeError, Result};

/// Namespace of the extension element.
pub const GCM_NAMESPACE: &str = "google:mobile:data";
/// Name of the extension element.
pub const GCM_ELEMENT: &str = "gcm";

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Extension block carrying one JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcmExtension {
    json: String,
    xml: String,
}

impl GcmExtension {
    pub fn new(json: impl Into<String>) -> Self {
        let json = json.into();
        let xml = format!(
            "<{GCM_ELEMENT} xmlns='{GCM_NAMESPACE}'>{}</{GCM_ELEMENT}>",
            escape_xml(&json)
        );
        Self { json, xml }
    }

    /// Carried JSON text, unescaped.
    pub fn json(&self) -> &str {
        &self.json
    }

    pub fn element_name(&self) -> &'static str {
        GCM_ELEMENT
    }

    pub fn namespace(&self) -> &'static str {
        GCM_NAMESPACE
    }

    /// Serialized XML element.
    pub fn to_xml(&self) -> &str {
        &self.xml
    }
}

/// First child node of a parsed extension element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawNode {
    /// Character data (already unescaped).
    Text(String),
    /// A nested start tag.
    Element(String),
    /// The element closed without content.
    End,
}

/// Transport-level view of an extension element before the codec sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtension {
    pub element: String,
    pub namespace: String,
    pub first: RawNode,
}

impl RawExtension {
    pub fn matches(&self, element: &str, namespace: &str) -> bool {
        self.element == element && self.namespace == namespace
    }
}

/// Wrap JSON text into an extension block.
pub fn encode(json: &str) -> GcmExtension {
    GcmExtension::new(json)
}

/// Extract the carried JSON text from a parsed extension element.
pub fn decode(raw: &RawExtension) -> Result<String> {
    if !raw.matches(GCM_ELEMENT, GCM_NAMESPACE) {
        return Err(malformed(format!(
            "unexpected element {{{}}}{}",
            raw.namespace, raw.element
        )));
    }
    match &raw.first {
        RawNode::Text(text) => Ok(text.clone()),
        RawNode::Element(name) => Err(malformed(format!(
            "unexpected tag type: START_TAG <{name}>"
        ))),
        RawNode::End => Err(malformed("unexpected tag type: END_TAG")),
    }
}

/// Parse one serialized extension element into its raw view.
///
/// Only the shape produced by [`GcmExtension::to_xml`] and by the relay is
/// supported: one element, attributes, and either text, a CDATA section, a
/// nested tag, or nothing as first child.
pub fn parse_extension_xml(xml: &str) -> Result<RawExtension> {
    let s = xml.trim();
    let rest = s
        .strip_prefix('<')
        .ok_or_else(|| malformed("missing start tag"))?;
    let tag_end = find_tag_end(rest).ok_or_else(|| malformed("unterminated start tag"))?;
    let (tag, after) = (&rest[..tag_end], &rest[tag_end + 1..]);

    let (tag, self_closing) = match tag.strip_suffix('/') {
        Some(t) => (t, true),
        None => (tag, false),
    };

    let tag = tag.trim_start();
    let name_end = tag.find(char::is_whitespace).unwrap_or(tag.len());
    let element = tag[..name_end].to_string();
    if element.is_empty() {
        return Err(malformed("empty element name"));
    }

    let namespace = parse_attrs(&tag[name_end..])?
        .into_iter()
        .find(|(k, _)| *k == "xmlns")
        .map(|(_, v)| v)
        .unwrap_or_default();

    if self_closing {
        return Ok(RawExtension { element, namespace, first: RawNode::End });
    }

    let closing = format!("</{element}>");
    let body = after
        .strip_suffix(closing.as_str())
        .ok_or_else(|| malformed(format!("missing closing tag {closing}")))?;

    let first = if body.is_empty() {
        RawNode::End
    } else if let Some(cdata) = body.strip_prefix(CDATA_START) {
        // CDATA is character data: kept verbatim, no entity resolution.
        let end = cdata
            .find(CDATA_END)
            .ok_or_else(|| malformed("unterminated CDATA section"))?;
        RawNode::Text(cdata[..end].to_string())
    } else if let Some(inner) = body.strip_prefix('<') {
        let name: String = inner
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
            .collect();
        RawNode::Element(name)
    } else {
        let text_end = body.find('<').unwrap_or(body.len());
        RawNode::Text(unescape_xml(&body[..text_end])?)
    };

    Ok(RawExtension { element, namespace, first })
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Resolve named and numeric character references.
pub fn unescape_xml(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let semi = tail
            .find(';')
            .ok_or_else(|| malformed("unterminated entity"))?;
        let entity = &tail[..semi];
        let ch = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => numeric_entity(entity)
                .ok_or_else(|| malformed(format!("unknown entity &{entity};")))?,
        };
        out.push(ch);
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn numeric_entity(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse().ok()?
    };
    char::from_u32(code)
}

/// Byte index of the `>` closing the start tag, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attrs(mut s: &str) -> Result<Vec<(&str, String)>> {
    let mut out = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            return Ok(out);
        }
        let eq = s
            .find('=')
            .ok_or_else(|| malformed("attribute without value"))?;
        let name = s[..eq].trim();
        let rest = s[eq + 1..].trim_start();
        let quote = rest
            .chars()
            .next()
            .filter(|c| *c == '\'' || *c == '"')
            .ok_or_else(|| malformed("unquoted attribute value"))?;
        let value_end = rest[1..]
            .find(quote)
            .ok_or_else(|| malformed("unterminated attribute value"))?;
        out.push((name, unescape_xml(&rest[1..1 + value_end])?));
        s = &rest[value_end + 2..];
    }
}

fn malformed(msg: impl Into<String>) -> BridgeError {
    BridgeError::MalformedExtension(msg.into())
}
