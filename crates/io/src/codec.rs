//! Typed attribute access on top of the string-valued element tree.
//!
//! Readers never fail: a missing or unparseable attribute yields the caller's
//! default, which is how persisted layers stay readable across versions.

use std::str::FromStr;

use crate::xml::XmlElement;

impl XmlElement {
    pub fn attribute_parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.attribute(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn attribute_f64(&self, name: &str, default: f64) -> f64 {
        self.attribute_parsed(name).unwrap_or(default)
    }

    /// Booleans are stored as "1"/"0"; "true"/"false" are accepted on read.
    pub fn attribute_bool(&self, name: &str, default: bool) -> bool {
        match self.attribute(name).map(str::trim) {
            Some("1") => true,
            Some("0") => false,
            Some(v) if v.eq_ignore_ascii_case("true") => true,
            Some(v) if v.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    pub fn set_attribute_bool(&mut self, name: &str, value: bool) {
        self.set_attribute(name, if value { "1" } else { "0" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_fallback() {
        let mut el = XmlElement::new("elevation");
        el.set_attribute("zscale", "2.5");
        el.set_attribute("zoffset", "not a number");

        assert_eq!(el.attribute_f64("zscale", 1.0), 2.5);
        assert_eq!(el.attribute_f64("zoffset", 0.0), 0.0);
        assert_eq!(el.attribute_f64("missing", 7.0), 7.0);
    }

    #[test]
    fn test_f64_display_is_exact() {
        let mut el = XmlElement::new("e");
        let value = 0.1 + 0.2;
        el.set_attribute("v", value);
        assert_eq!(el.attribute_f64("v", 0.0), value);
    }

    #[test]
    fn test_bool_tokens() {
        let mut el = XmlElement::new("e");
        el.set_attribute_bool("a", true);
        el.set_attribute("b", "false");
        el.set_attribute("c", "maybe");

        assert_eq!(el.attribute("a"), Some("1"));
        assert!(el.attribute_bool("a", false));
        assert!(!el.attribute_bool("b", true));
        assert!(el.attribute_bool("c", true));
        assert!(!el.attribute_bool("missing", false));
    }
}
