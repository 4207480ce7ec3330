//! Prefixed XML names as they appear in `type`, `ref` and `base` attributes.

/// A split `prefix:local` name borrowed from an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local: &'a str,
}

impl<'a> QName<'a> {
    /// Split a raw attribute value. Surrounding whitespace is ignored.
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() => Self {
                prefix: Some(prefix),
                local,
            },
            _ => Self {
                prefix: None,
                local: raw,
            },
        }
    }

    /// Render back to `prefix:local` form.
    pub fn format(prefix: Option<&str>, local: &str) -> String {
        match prefix {
            Some(p) if !p.is_empty() => format!("{p}:{local}"),
            _ => local.to_string(),
        }
    }
}
