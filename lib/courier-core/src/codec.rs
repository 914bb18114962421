//! Content-type driven body encoding and decoding.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::arena::Arena;
use crate::{Error, Result};

/// `application/json`.
pub const MIME_JSON: &str = "application/json";
/// `application/json; charset=UTF-8`, the default request content type.
pub const MIME_JSON_UTF8: &str = "application/json; charset=UTF-8";
/// `application/xml`.
pub const MIME_XML: &str = "application/xml";
/// `application/xml; charset=UTF-8`.
pub const MIME_XML_UTF8: &str = "application/xml; charset=UTF-8";
/// `text/xml`.
pub const MIME_TEXT_XML: &str = "text/xml";
/// `application/x-www-form-urlencoded`.
pub const MIME_FORM: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`.
pub const MIME_MULTIPART_FORM: &str = "multipart/form-data";
/// `text/plain; charset=UTF-8`.
pub const MIME_TEXT_PLAIN: &str = "text/plain; charset=UTF-8";

/// Strip the parameters of a content type and lowercase it.
///
/// ```
/// assert_eq!(courier_core::media_type("Application/JSON; charset=UTF-8"), "application/json");
/// ```
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

// ============================================================================
// Formats
// ============================================================================

/// Wire format of a structured body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// JSON, via `serde_json`.
    Json,
    /// XML, via `quick-xml`.
    Xml,
    /// URL-encoded form, via `serde_html_form`.
    Form,
}

impl Format {
    /// Canonical MIME type.
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        match self {
            Self::Json => MIME_JSON,
            Self::Xml => MIME_XML,
            Self::Form => MIME_FORM,
        }
    }

    /// Encode a value, appending to `buf`.
    pub fn encode<T>(self, value: &T, buf: &mut BytesMut) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        match self {
            Self::Json => serde_json::to_writer(BufMut::writer(&mut *buf), value)
                .map_err(|err| Error::encode(self.mime(), err)),
            Self::Xml => {
                let xml = quick_xml::se::to_string(value)
                    .map_err(|err| Error::encode(self.mime(), err))?;
                buf.extend_from_slice(xml.as_bytes());
                Ok(())
            }
            Self::Form => {
                let form = to_form(value)?;
                buf.extend_from_slice(form.as_bytes());
                Ok(())
            }
        }
    }

    /// Decode a value.
    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T> {
        match self {
            Self::Json => from_json(body),
            Self::Xml => {
                quick_xml::de::from_reader(body).map_err(|err| Error::decode(self.mime(), err))
            }
            Self::Form => {
                serde_html_form::from_bytes(body).map_err(|err| Error::decode(self.mime(), err))
            }
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Deserialize JSON bytes with path-aware error messages.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|err| Error::json_deserialization(err.path().to_string(), err.inner().to_string()))
}

/// Form-encode a value.
///
/// Values `serde_html_form` cannot encode directly, such as maps holding
/// numbers or nested structures, are flattened to a string-keyed map of
/// their textual values first.
pub fn to_form<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    match serde_html_form::to_string(value) {
        Ok(form) => Ok(form),
        Err(first) => {
            let serde_json::Value::Object(fields) =
                serde_json::to_value(value).map_err(|err| Error::encode(MIME_FORM, err))?
            else {
                return Err(Error::encode(MIME_FORM, first));
            };
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &fields {
                form.append_pair(key, &scalar_text(value));
            }
            Ok(form.finish())
        }
    }
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Codec Table
// ============================================================================

/// Table mapping MIME types to formats.
///
/// Cloning is cheap, the table is shared until [`Codec::register`] is called.
#[derive(Debug, Clone)]
pub struct Codec {
    formats: Arc<BTreeMap<String, Format>>,
}

impl Default for Codec {
    fn default() -> Self {
        let formats = [
            (MIME_JSON, Format::Json),
            (MIME_XML, Format::Xml),
            (MIME_TEXT_XML, Format::Xml),
            (MIME_FORM, Format::Form),
        ]
        .into_iter()
        .map(|(mime, format)| (mime.to_string(), format))
        .collect();
        Self {
            formats: Arc::new(formats),
        }
    }
}

impl Codec {
    /// A table without any entry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            formats: Arc::default(),
        }
    }

    /// Register (or replace) the format for a MIME type.
    ///
    /// Parameters such as `charset` are ignored.
    pub fn register(&mut self, content_type: &str, format: Format) {
        Arc::make_mut(&mut self.formats).insert(media_type(content_type), format);
    }

    /// Find the format for a content type.
    pub fn lookup(&self, content_type: Option<&str>) -> Result<Format> {
        let media = content_type.map(media_type).unwrap_or_default();
        if media.is_empty() {
            return Err(Error::MissingContentType);
        }
        self.formats
            .get(&media)
            .copied()
            .ok_or(Error::UnsupportedContentType(media))
    }

    /// Registered `(mime, format)` entries.
    pub fn formats(&self) -> impl Iterator<Item = (&str, Format)> {
        self.formats
            .iter()
            .map(|(mime, format)| (mime.as_str(), *format))
    }

    /// Encode a value for a content type, appending to `buf`.
    pub fn encode<T>(&self, content_type: Option<&str>, value: &T, buf: &mut BytesMut) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.lookup(content_type)?.encode(value, buf)
    }

    /// Decode a body into a destination according to its content type.
    pub fn decode_into(
        &self,
        content_type: Option<&str>,
        body: &[u8],
        dst: &mut dyn Destination,
    ) -> Result<()> {
        let format = self.lookup(content_type)?;
        dst.decode(format, body)
    }
}

// ============================================================================
// Payloads and Destinations
// ============================================================================

/// Raw request body, written through without any content-type lookup.
pub enum Payload {
    /// Bytes.
    Bytes(Bytes),
    /// UTF-8 text.
    Text(String),
    /// A reader drained when the body is set.
    Reader(Box<dyn Read + Send>),
}

impl Payload {
    /// Wrap a reader.
    #[must_use]
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Materialize the payload, draining readers through the arena.
    pub fn into_bytes(self, arena: &Arena) -> Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Text(text) => Ok(Bytes::from(text)),
            Self::Reader(mut reader) => {
                let mut buf = arena.acquire();
                std::io::copy(&mut reader, &mut BufMut::writer(&mut *buf))?;
                Ok(buf.to_bytes())
            }
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            Self::Reader(_) => f.write_str("Reader"),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Payload {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Request body of any shape.
///
/// Raw payloads (bytes, strings, readers) are sent as is, whatever the
/// `Content-Type`. Structured values, built with [`Body::value`], are encoded
/// through the [`Codec`] entry of the request `Content-Type`.
///
/// ```
/// use courier_core::Body;
///
/// let csv = Body::from("a,b\n1,2");
/// let user = Body::value(&serde_json::json!({ "name": "alice" })).expect("value");
/// let none = Body::from(());
/// # let _ = (csv, user, none);
/// ```
#[derive(Debug, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Sent as is.
    Raw(Payload),
    /// Encoded according to the `Content-Type`.
    Value(serde_json::Value),
}

impl Body {
    /// Capture a structured value for encoding.
    pub fn value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Value)
            .map_err(|err| Error::encode("value", err))
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

impl From<Payload> for Body {
    fn from(payload: Payload) -> Self {
        Self::Raw(payload)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes.into())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes.into())
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Raw(bytes.into())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Raw(text.into())
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Raw(text.into())
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Decode target for response bodies.
///
/// Implemented for every `DeserializeOwned` type, the decoded value replaces
/// the current one.
pub trait Destination: Send {
    /// Decode `body` with `format` into `self`.
    fn decode(&mut self, format: Format, body: &[u8]) -> Result<()>;
}

impl<T> Destination for T
where
    T: DeserializeOwned + Send,
{
    fn decode(&mut self, format: Format, body: &[u8]) -> Result<()> {
        *self = format.decode(body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    fn alice() -> User {
        User {
            name: "Alice".to_string(),
            age: 30,
        }
    }

    fn encode(codec: &Codec, content_type: &str, value: &impl Serialize) -> Result<String> {
        let mut buf = BytesMut::new();
        codec.encode(Some(content_type), value, &mut buf)?;
        Ok(String::from_utf8(buf.to_vec()).expect("utf8"))
    }

    #[test]
    fn media_type_strips_parameters() {
        assert_eq!(media_type("application/json; charset=UTF-8"), "application/json");
        assert_eq!(media_type(" TEXT/XML "), "text/xml");
        assert_eq!(media_type(""), "");
    }

    #[test]
    fn lookup_ignores_charset() {
        let codec = Codec::default();
        assert_eq!(codec.lookup(Some(MIME_JSON_UTF8)).expect("json"), Format::Json);
        assert_eq!(codec.lookup(Some(MIME_XML_UTF8)).expect("xml"), Format::Xml);
        assert_eq!(codec.lookup(Some(MIME_FORM)).expect("form"), Format::Form);
    }

    #[test]
    fn lookup_missing_and_unsupported() {
        let codec = Codec::default();
        assert!(matches!(codec.lookup(None), Err(Error::MissingContentType)));
        assert!(matches!(codec.lookup(Some("")), Err(Error::MissingContentType)));
        assert!(matches!(
            codec.lookup(Some("text/csv")),
            Err(Error::UnsupportedContentType(media)) if media == "text/csv"
        ));
    }

    #[test]
    fn register_does_not_affect_clones() {
        let base = Codec::default();
        let mut custom = base.clone();
        custom.register("application/vnd.api+json; charset=UTF-8", Format::Json);

        assert_eq!(
            custom.lookup(Some("application/vnd.api+json")).expect("custom"),
            Format::Json
        );
        assert!(base.lookup(Some("application/vnd.api+json")).is_err());
    }

    #[test]
    fn json_round_trip() {
        let codec = Codec::default();
        let body = encode(&codec, MIME_JSON_UTF8, &alice()).expect("encode");
        assert_eq!(body, r#"{"name":"Alice","age":30}"#);

        let mut user = User {
            name: String::new(),
            age: 0,
        };
        codec
            .decode_into(Some(MIME_JSON), body.as_bytes(), &mut user)
            .expect("decode");
        assert_eq!(user, alice());
    }

    #[test]
    fn xml_encode_and_decode() {
        let codec = Codec::default();
        let body = encode(&codec, MIME_XML, &alice()).expect("encode");
        assert_eq!(body, "<User><name>Alice</name><age>30</age></User>");

        let user: User = Format::Xml.decode(body.as_bytes()).expect("decode");
        assert_eq!(user, alice());
    }

    #[test]
    fn form_encode_struct() {
        let codec = Codec::default();
        let body = encode(&codec, MIME_FORM, &alice()).expect("encode");
        assert_eq!(body, "name=Alice&age=30");
    }

    #[test]
    fn form_encode_stringifies_nested_values() {
        let mut fields = BTreeMap::new();
        fields.insert("meta", serde_json::json!({"a": 1}));
        fields.insert("name", serde_json::json!("bob"));

        let body = to_form(&fields).expect("encode");
        assert_eq!(body, "meta=%7B%22a%22%3A1%7D&name=bob");
    }

    #[test]
    fn form_decode() {
        let user: User = Format::Form.decode(b"name=Alice&age=30").expect("decode");
        assert_eq!(user, alice());
    }

    #[test]
    fn json_decode_error_has_path() {
        let err = Format::Json
            .decode::<User>(br#"{"name":"Alice","age":"old"}"#)
            .expect_err("should fail");
        assert!(matches!(
            err,
            Error::JsonDeserialization { ref path, .. } if path == "age"
        ));
    }

    #[test]
    fn structured_value_needs_content_type() {
        let mut buf = BytesMut::new();
        let err = Codec::default()
            .encode(None, &alice(), &mut buf)
            .expect_err("should fail");
        assert!(matches!(err, Error::MissingContentType));
        assert!(buf.is_empty());
    }

    #[test]
    fn payload_reader_is_drained() {
        let arena = Arena::new(16, 2, 1024);
        let payload = Payload::reader(std::io::Cursor::new(b"streamed body".to_vec()));
        let bytes = payload.into_bytes(&arena).expect("drain");
        assert_eq!(bytes.as_ref(), b"streamed body");
        assert_eq!(arena.pooled(), 1);
    }

    #[test]
    fn body_value_keeps_structure() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
        }

        let Ok(Body::Value(value)) = Body::value(&Login { user: "alice" }) else {
            panic!("expected a structured body");
        };
        assert_eq!(value, serde_json::json!({ "user": "alice" }));
    }

    #[test]
    fn payload_conversions() {
        assert!(matches!(Payload::from("text"), Payload::Text(_)));
        assert!(matches!(Body::from("a,b"), Body::Raw(Payload::Text(_))));
        assert!(matches!(Body::from(vec![1_u8]), Body::Raw(Payload::Bytes(_))));
        assert!(matches!(Body::from(()), Body::Empty));
        assert!(matches!(Payload::from(vec![1_u8]), Payload::Bytes(_)));
        assert!(matches!(Payload::from(Bytes::from_static(b"x")), Payload::Bytes(_)));
    }
}
