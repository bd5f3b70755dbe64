//! `gcm` extension codec tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ccsbridge_core::protocol::extension::{
    decode, encode, escape_xml, parse_extension_xml, GCM_ELEMENT, GCM_NAMESPACE,
};

mod vector_loader;
use vector_loader::load;

#[test]
fn extension_vectors() {
    let files = [
        "ext_escaped_json.json",
        "ext_double_quoted_ns.json",
        "ext_nested_element.json",
        "ext_empty_body.json",
        "ext_wrong_namespace.json",
        "ext_unknown_entity.json",
        "ext_cdata.json",
        "ext_cdata_unterminated.json",
    ];

    for f in files {
        let v = load(f);
        let res = parse_extension_xml(&v.input).and_then(|raw| decode(&raw));

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.kind().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let json = res.expect("expected ok json");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(json, ex["json"].as_str().unwrap(), "vector={}", v.description);
    }
}

#[test]
fn encode_renders_fixed_element_and_namespace() {
    let ext = encode(r#"{"a":"<b>"}"#);
    assert_eq!(ext.element_name(), GCM_ELEMENT);
    assert_eq!(ext.namespace(), GCM_NAMESPACE);
    assert_eq!(
        ext.to_xml(),
        "<gcm xmlns='google:mobile:data'>{&quot;a&quot;:&quot;&lt;b&gt;&quot;}</gcm>"
    );
}

#[test]
fn decode_of_encode_is_lossless() {
    let samples = [
        "{}",
        r#"{"message_id":"m1","from":"dev1"}"#,
        r#"{"text":"Tom & Jerry's <show> \"live\""}"#,
        r#"{"emoji":"🚀","ko":"안녕","escaped":"&amp;"}"#,
        "&amp; literally",
        "  leading and trailing spaces  ",
        "line\nbreak\ttab",
    ];

    for t in samples {
        let ext = encode(t);
        assert_eq!(ext.json(), t);
        let raw = parse_extension_xml(ext.to_xml()).unwrap();
        assert_eq!(decode(&raw).unwrap(), t, "sample={t:?}");
    }
}

#[test]
fn escape_covers_the_five_specials() {
    assert_eq!(escape_xml(r#"&<>"'"#), "&amp;&lt;&gt;&quot;&apos;");
}
