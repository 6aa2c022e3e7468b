//! Metric identity encoding: `[kind:]name[@source]`

use std::fmt;
use std::str::FromStr;

use crate::domain::error::StoreError;
use crate::domain::kinds::Kind;

/// Maximum length of parameter, source and report names, in characters
pub const MAX_NAME_LENGTH: usize = 512;

/// Kind used when an identity carries no `kind:` prefix
pub const DEFAULT_KIND: Kind = Kind::Int;

/// Parsed metric identity as it appears in request paths
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    pub kind: Kind,
    pub name: String,
    pub source: Option<String>,
}

impl MetricIdentity {
    pub fn new(kind: Kind, name: impl Into<String>, source: Option<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            source,
        }
    }

    /// Display label: `name` or `name@source`
    pub fn label(&self) -> String {
        match &self.source {
            Some(source) => format!("{}@{}", self.name, source),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.label())
    }
}

impl FromStr for MetricIdentity {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || StoreError::MalformedIdentity(raw.to_string());

        let (kind, rest) = match raw.split_once(':') {
            Some(("", _)) => return Err(malformed()),
            Some((tag, rest)) => (tag.parse::<Kind>()?, rest),
            None => (DEFAULT_KIND, raw),
        };
        let (name, source) = match rest.split_once('@') {
            Some((name, source)) => (name, Some(source)),
            None => (rest, None),
        };

        if !is_valid_segment(name) || !source.is_none_or(is_valid_segment) {
            return Err(malformed());
        }

        Ok(Self::new(kind, name, source.map(String::from)))
    }
}

/// 1..=512 characters, none of which is a path delimiter or whitespace
fn is_valid_segment(segment: &str) -> bool {
    let len = segment.chars().count();
    (1..=MAX_NAME_LENGTH).contains(&len)
        && !segment
            .chars()
            .any(|c| matches!(c, ':' | '/' | '@') || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<MetricIdentity, StoreError> {
        raw.parse()
    }

    #[test]
    fn test_parse_defaults_to_int() {
        let id = parse("cpu.load").unwrap();
        assert_eq!(id, MetricIdentity::new(Kind::Int, "cpu.load", None));
        assert_eq!(id.to_string(), "int:cpu.load");
    }

    #[test]
    fn test_parse_kind_and_source() {
        let id = parse("float:zz.f@host1").unwrap();
        assert_eq!(id.kind, Kind::Float);
        assert_eq!(id.name, "zz.f");
        assert_eq!(id.source.as_deref(), Some("host1"));
        assert_eq!(id.label(), "zz.f@host1");
        assert_eq!(id.to_string(), "float:zz.f@host1");
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert!(matches!(parse("blob:x"), Err(StoreError::UnknownKind(tag)) if tag == "blob"));
    }

    #[test]
    fn test_parse_malformed() {
        for raw in [
            "",
            ":x",
            "int:",
            "int:a:b",
            "a@",
            "@host",
            "a@b@c",
            "a b",
            "a/b",
            "int:x@host/1",
            "x@ho st",
        ] {
            assert!(
                matches!(parse(raw), Err(StoreError::MalformedIdentity(_))),
                "expected malformed: {raw:?}"
            );
        }
    }

    #[test]
    fn test_parse_length_bounds() {
        let max = "n".repeat(MAX_NAME_LENGTH);
        assert!(parse(&max).is_ok());
        assert!(parse(&format!("x@{max}")).is_ok());

        let too_long = "n".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(parse(&too_long), Err(StoreError::MalformedIdentity(_))));
        assert!(matches!(
            parse(&format!("x@{too_long}")),
            Err(StoreError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_parse_non_ascii_name() {
        let id = parse("string:температура@дача").unwrap();
        assert_eq!(id.name, "температура");
        assert_eq!(id.source.as_deref(), Some("дача"));
    }
}
