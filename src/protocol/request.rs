use super::types::{CapabilityKey, ObjectKind, Verb};

/// Root of every command path
pub const COMMAND_PATH: &str = "/prog";

/// Encodes a parameter value for the query string
///
/// Only space, `%`, `&` and `?` are escaped. The input is scanned once so
/// an escape sequence is never itself re-escaped.
pub fn encode_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '?' => out.push_str("%3F"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`encode_value`]
///
/// Sequences other than the four escapes are left as they are.
pub fn decode_value(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(..3) {
            Some("%20") => Some(' '),
            Some("%25") => Some('%'),
            Some("%26") => Some('&'),
            Some(seq) if seq.eq_ignore_ascii_case("%3F") => Some('?'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// A single TPI command
///
/// Parameters are kept in insertion order and rendered as
/// `&name=value` after the object name.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    verb: Verb,
    object: ObjectKind,
    params: Vec<(String, String)>,
}

impl Request {
    pub fn new(verb: Verb, object: ObjectKind) -> Self {
        Request {
            verb,
            object,
            params: Vec::new(),
        }
    }

    /// Shorthand for a parameterless `show` request
    pub fn show(object: ObjectKind) -> Self {
        Request::new(Verb::Show, object)
    }

    /// Appends a parameter; the value is encoded when the request is rendered
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn object(&self) -> ObjectKind {
        self.object
    }

    pub fn key(&self) -> CapabilityKey {
        CapabilityKey::new(self.verb, self.object)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Renders the relative target, `/prog/{verb}?{object}&name=value...`
    pub fn target(&self) -> String {
        let mut target = format!("{}/{}?{}", COMMAND_PATH, self.verb, self.object);
        for (name, value) in &self.params {
            target.push('&');
            target.push_str(name);
            target.push('=');
            target.push_str(&encode_value(value));
        }
        target
    }

    /// Renders the absolute URI against a base such as `http://10.0.0.1`
    pub fn uri(&self, base_uri: &str) -> String {
        format!("{}{}", base_uri.trim_end_matches('/'), self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value() {
        assert_eq!(encode_value("50%"), "50%25");
        assert_eq!(encode_value("a&b"), "a%26b");
        assert_eq!(encode_value("who? me"), "who%3F%20me");
        assert_eq!(encode_value("%20"), "%2520");
        assert_eq!(encode_value("plain-text_1.5"), "plain-text_1.5");
    }

    #[test]
    fn test_decode_reproduces_original() {
        for original in ["50%", "a&b", "is it? yes & no 100%", "%20 literally", "%%??&& "] {
            assert_eq!(decode_value(&encode_value(original)), original);
        }
    }

    #[test]
    fn test_decode_leaves_unknown_escapes() {
        assert_eq!(decode_value("a%2Fb%"), "a%2Fb%");
    }

    #[test]
    fn test_target_without_params() {
        let req = Request::show(ObjectKind::SerialNumber);
        assert_eq!(req.target(), "/prog/show?serialnumber");
    }

    #[test]
    fn test_target_with_params_in_order() {
        let req = Request::new(Verb::Set, ObjectKind::Antenna)
            .param("type", 31)
            .param("height", 1.5)
            .param("measMethod", "Bottom of mount");
        assert_eq!(
            req.target(),
            "/prog/set?antenna&type=31&height=1.5&measMethod=Bottom%20of%20mount"
        );
    }

    #[test]
    fn test_uri_joins_base() {
        let req = Request::new(Verb::Set, ObjectKind::ElevationMask).param("mask", -5);
        assert_eq!(
            req.uri("http://192.168.1.10/"),
            "http://192.168.1.10/prog/set?elevationmask&mask=-5"
        );
        assert_eq!(req.key(), CapabilityKey::new(Verb::Set, ObjectKind::ElevationMask));
    }
}
