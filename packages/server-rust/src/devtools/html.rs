//! Minimal HTML builder that keeps markup and data apart.
//!
//! Markup can only be appended from `&'static str` literals; anything that is
//! computed at runtime goes through [`Html::text`] or [`Html::attr`], which
//! escape for element content and double-quoted attribute values respectively.

/// Append `value` to `out`, replacing HTML-significant characters with entities.
///
/// The output is safe both as element content and inside a quoted attribute.
pub fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Escape `value` for use in HTML element content or attribute values.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    push_escaped(&mut out, value);
    out
}

/// An HTML fragment under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html {
    buf: String,
}

impl Html {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Append literal markup.
    pub fn raw(&mut self, markup: &'static str) -> &mut Self {
        self.buf.push_str(markup);
        self
    }

    /// Append escaped text content.
    pub fn text(&mut self, value: &str) -> &mut Self {
        push_escaped(&mut self.buf, value);
        self
    }

    /// Append ` name="value"` with `value` escaped.
    pub fn attr(&mut self, name: &'static str, value: &str) -> &mut Self {
        self.buf.push(' ');
        self.buf.push_str(name);
        self.buf.push_str("=\"");
        push_escaped(&mut self.buf, value);
        self.buf.push('"');
        self
    }

    /// Append another already-built fragment.
    pub fn fragment(&mut self, other: &Html) -> &mut Self {
        self.buf.push_str(&other.buf);
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }
}
