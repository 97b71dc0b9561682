//! Path segments and typed parameters.
//!
//! # Responsibilities
//! - Represent one URL path component: static text or a typed parameter
//! - Resolve parameter type tags against the closed converter set
//! - Format segments for the route table (`{int:id}`) and for the
//!   introspection tree (`[int:id]`)
//! - Parse raw path values into typed values
//!
//! # Design Decisions
//! - The type set is closed; an unknown tag fails at construction time
//! - `Path` is a catch-all: it captures the remaining path including `/`
//! - The segment literally named `/` is a root marker and contributes
//!   nothing to compiled paths

use std::fmt;

use uuid::Uuid;

use crate::api::ApiError;

/// Parameter types accepted in endpoint declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Int,
    Float,
    Path,
    Uuid,
}

impl ParamType {
    /// All valid tags, in declaration order.
    pub const TAGS: &'static [(&'static str, ParamType)] = &[
        ("string", ParamType::String),
        ("int", ParamType::Int),
        ("float", ParamType::Float),
        ("path", ParamType::Path),
        ("uuid", ParamType::Uuid),
    ];

    /// Resolve a type tag, case-insensitively.
    pub fn resolve(tag: &str) -> Result<Self, ApiError> {
        let lower = tag.to_lowercase();
        Self::TAGS
            .iter()
            .find(|(t, _)| *t == lower)
            .map(|(_, ty)| *ty)
            .ok_or_else(|| ApiError::InvalidParameterType(tag.to_string()))
    }

    /// The canonical tag for this type.
    pub fn tag(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Path => "path",
            ParamType::Uuid => "uuid",
        }
    }

    /// Parse a raw captured value into the target value type.
    pub fn parse(&self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamType::String | ParamType::Path => Some(ParamValue::Str(raw.to_string())),
            ParamType::Int => raw.parse::<i64>().ok().map(ParamValue::Int),
            ParamType::Float => raw.parse::<f64>().ok().map(ParamValue::Float),
            ParamType::Uuid => Uuid::parse_str(raw).ok().map(ParamValue::Uuid),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A parsed parameter value, one variant per [`ParamType`] target.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            ParamValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

/// One component of an endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Literal path text, matched exactly.
    Static(String),
    /// A typed parameter, captured from the request path.
    Parameter { name: String, ty: ParamType },
}

impl PathSegment {
    pub fn fixed(name: impl Into<String>) -> Self {
        PathSegment::Static(name.into())
    }

    pub fn param(name: impl Into<String>, ty: ParamType) -> Self {
        PathSegment::Parameter {
            name: name.into(),
            ty,
        }
    }

    /// Build a parameter segment from a string tag, failing on unknown tags.
    pub fn param_tagged(name: impl Into<String>, tag: &str) -> Result<Self, ApiError> {
        Ok(PathSegment::Parameter {
            name: name.into(),
            ty: ParamType::resolve(tag)?,
        })
    }

    /// The root marker: elided from compiled paths.
    pub fn is_root(&self) -> bool {
        matches!(self, PathSegment::Static(s) if s == "/")
    }

    /// Route-table form: literal text, or `{type:name}` for parameters.
    pub fn format_wire(&self) -> String {
        match self {
            PathSegment::Static(s) => s.clone(),
            PathSegment::Parameter { name, ty } => format!("{{{}:{}}}", ty.tag(), name),
        }
    }

    /// Introspection form: literal text, or `[type:name]` for parameters.
    pub fn format_display(&self) -> String {
        match self {
            PathSegment::Static(s) => s.clone(),
            PathSegment::Parameter { name, ty } => format!("[{}:{}]", ty.tag(), name),
        }
    }

    /// Parse a display-form segment back into a segment.
    ///
    /// `[int:id]` recovers `Parameter { name: "id", ty: Int }`; anything
    /// not bracketed is a static segment. A bracketed segment with an
    /// unknown tag is an error.
    pub fn parse_display(text: &str) -> Result<Self, ApiError> {
        match text.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            Some(inner) => {
                let (tag, name) = inner
                    .split_once(':')
                    .ok_or_else(|| ApiError::InvalidParameterType(inner.to_string()))?;
                PathSegment::param_tagged(name, tag)
            }
            None => Ok(PathSegment::Static(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        assert_eq!(ParamType::resolve("int").unwrap(), ParamType::Int);
        assert_eq!(ParamType::resolve("UUID").unwrap(), ParamType::Uuid);
        assert_eq!(ParamType::resolve("Float").unwrap(), ParamType::Float);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = ParamType::resolve("number").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameterType(_)));
    }

    #[test]
    fn wire_and_display_forms() {
        let seg = PathSegment::param("id", ParamType::Int);
        assert_eq!(seg.format_wire(), "{int:id}");
        assert_eq!(seg.format_display(), "[int:id]");
        assert_eq!(PathSegment::fixed("user").format_wire(), "user");
    }

    #[test]
    fn display_round_trip() {
        for ty in [
            ParamType::String,
            ParamType::Int,
            ParamType::Float,
            ParamType::Path,
            ParamType::Uuid,
        ] {
            let seg = PathSegment::param("value", ty);
            let parsed = PathSegment::parse_display(&seg.format_display()).unwrap();
            assert_eq!(parsed, seg);
        }
        let fixed = PathSegment::fixed("about");
        assert_eq!(
            PathSegment::parse_display(&fixed.format_display()).unwrap(),
            fixed
        );
    }

    #[test]
    fn typed_value_parsing() {
        assert_eq!(
            ParamType::Int.parse("42"),
            Some(ParamValue::Int(42))
        );
        assert_eq!(ParamType::Int.parse("4.2"), None);
        assert_eq!(
            ParamType::Float.parse("4.2"),
            Some(ParamValue::Float(4.2))
        );
        assert!(ParamType::Uuid.parse("not-a-uuid").is_none());
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            ParamType::Uuid.parse(id),
            Some(ParamValue::Uuid(Uuid::parse_str(id).unwrap()))
        );
    }

    #[test]
    fn value_accessors_match_their_variants() {
        assert_eq!(ParamValue::Int(7).as_int(), Some(7));
        assert_eq!(ParamValue::Float(4.2).as_float(), Some(4.2));
        assert_eq!(ParamValue::Int(7).as_float(), None);
        assert_eq!(ParamValue::Str("x".to_string()).as_str(), Some("x"));
    }

    #[test]
    fn root_marker() {
        assert!(PathSegment::fixed("/").is_root());
        assert!(!PathSegment::fixed("user").is_root());
    }
}
