//! Extension offers and agreements.
//!
//! From [RFC-6455 Section 9.1](https://datatracker.ietf.org/doc/html/rfc6455#section-9.1):
//!
//! ```text
//! Sec-WebSocket-Extensions = extension-list
//! extension-list = 1#extension
//! extension = extension-token *( ";" extension-param )
//! extension-param = token [ "=" (token | quoted-string) ]
//! ```

use crate::error::HandshakeError;

/// One extension with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    pub params: Vec<(String, Option<String>)>,
}

impl Extension {
    /// Create without parameters.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter.
    #[inline]
    pub fn with_param(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.params.push((name.into(), value.map(String::from)));
        self
    }

    /// Look up a parameter, `Some(None)` if it has no value.
    pub fn param(&self, name: &str) -> Option<Option<&str>> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref())
    }

    /// Parse a `sec-websocket-extensions` header value.
    pub fn parse_list(value: &str) -> Result<Vec<Extension>, HandshakeError> {
        let mut list = Vec::new();

        for item in value.split(',') {
            if item.trim().is_empty() {
                continue;
            }

            let mut parts = item.split(';').map(str::trim);
            let name = parts.next().unwrap_or_default();
            if name.is_empty() {
                return Err(HandshakeError::InvalidExtensionNegotiation(item.trim().to_string()));
            }

            let mut ext = Extension::new(name);
            for param in parts.filter(|p| !p.is_empty()) {
                let (k, v) = match param.split_once('=') {
                    Some((k, v)) => (k.trim(), Some(v.trim().trim_matches('"'))),
                    None => (param, None),
                };
                ext = ext.with_param(k, v);
            }
            list.push(ext);
        }

        Ok(list)
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in self.params.iter() {
            match v {
                Some(v) => write!(f, "; {}={}", k, v)?,
                None => write!(f, "; {}", k)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_extensions() {
        let list = Extension::parse_list(
            "permessage-deflate; client_max_window_bits; server_max_window_bits=\"10\", x-custom",
        )
        .unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "permessage-deflate");
        assert_eq!(list[0].param("client_max_window_bits"), Some(None));
        assert_eq!(list[0].param("server_max_window_bits"), Some(Some("10")));
        assert_eq!(list[0].param("server_no_context_takeover"), None);
        assert_eq!(list[1], Extension::new("x-custom"));
    }

    #[test]
    fn format_extension() {
        let ext = Extension::new("permessage-deflate")
            .with_param("client_max_window_bits", None)
            .with_param("server_max_window_bits", Some("15"));
        assert_eq!(
            ext.to_string(),
            "permessage-deflate; client_max_window_bits; server_max_window_bits=15"
        );
        assert_eq!(Extension::parse_list(&ext.to_string()).unwrap(), vec![ext]);
    }

    #[test]
    fn empty_name() {
        assert!(matches!(
            Extension::parse_list("; a=1"),
            Err(HandshakeError::InvalidExtensionNegotiation(_))
        ));
        assert_eq!(Extension::parse_list("").unwrap(), vec![]);
    }
}
