//! Packet model shared by the session and transports.

use bytes::Bytes;

use ccsbridge_core::protocol::extension::{escape_xml, GcmExtension, RawExtension};

/// Stanza kinds the transport distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Message,
    Presence,
    Iq,
}

impl PacketKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PacketKind::Message => "message",
            PacketKind::Presence => "presence",
            PacketKind::Iq => "iq",
        }
    }
}

/// An extension as the transport saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketExtension {
    /// Decoded by the session's provider.
    Gcm(GcmExtension),
    /// Matched the provider but failed to decode.
    Malformed { raw: RawExtension, error: String },
    /// No provider for this element/namespace.
    Unknown(RawExtension),
}

impl PacketExtension {
    fn matches(&self, element: &str, namespace: &str) -> bool {
        match self {
            PacketExtension::Gcm(ext) => {
                ext.element_name() == element && ext.namespace() == namespace
            }
            PacketExtension::Malformed { raw, .. } | PacketExtension::Unknown(raw) => {
                raw.matches(element, namespace)
            }
        }
    }
}

/// One stanza. The serialized form is rendered once and shared cheaply.
#[derive(Debug, Clone)]
pub struct Packet {
    kind: PacketKind,
    id: Option<String>,
    extensions: Vec<PacketExtension>,
    xml: Bytes,
}

impl Packet {
    pub fn new(kind: PacketKind, id: Option<String>, extensions: Vec<PacketExtension>) -> Self {
        let xml = render(kind, id.as_deref(), &extensions);
        Self { kind, id, extensions, xml }
    }

    /// Message packet carrying a single `gcm` extension.
    pub fn message(ext: GcmExtension) -> Self {
        Self::new(PacketKind::Message, None, vec![PacketExtension::Gcm(ext)])
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn extensions(&self) -> &[PacketExtension] {
        &self.extensions
    }

    pub fn find_extension(&self, element: &str, namespace: &str) -> Option<&PacketExtension> {
        self.extensions.iter().find(|e| e.matches(element, namespace))
    }

    /// Convenience: the decoded `gcm` block, if present and valid.
    pub fn gcm(&self) -> Option<&GcmExtension> {
        self.extensions.iter().find_map(|e| match e {
            PacketExtension::Gcm(ext) => Some(ext),
            _ => None,
        })
    }

    pub fn to_xml(&self) -> &Bytes {
        &self.xml
    }
}

fn render(kind: PacketKind, id: Option<&str>, extensions: &[PacketExtension]) -> Bytes {
    let mut out = format!("<{}", kind.as_str());
    if let Some(id) = id {
        out.push_str(&format!(" id='{}'", escape_xml(id)));
    }
    out.push('>');
    for ext in extensions {
        match ext {
            PacketExtension::Gcm(g) => out.push_str(g.to_xml()),
            PacketExtension::Malformed { raw, .. } | PacketExtension::Unknown(raw) => {
                out.push_str(&format!("<{} xmlns='{}'/>", raw.element, escape_xml(&raw.namespace)));
            }
        }
    }
    out.push_str(&format!("</{}>", kind.as_str()));
    Bytes::from(out)
}
