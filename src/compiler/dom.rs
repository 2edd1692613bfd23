//! Minimal markup tree and its serializer.
//!
//! Text and attribute values are always escaped. `raw` content is inserted
//! verbatim and must only carry trusted markup.

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with ordered attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
    /// Escaped text emitted before `children`.
    pub text: Option<String>,
    /// Trusted markup emitted verbatim before `children`.
    pub raw: Option<String>,
    pub self_closing: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn raw(mut self, html: impl Into<String>) -> Self {
        self.raw = Some(html.into());
        self
    }

    pub fn children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// Serialize a list of nodes to markup.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_into(text, out),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(value, out);
        out.push('"');
    }
    if element.self_closing {
        out.push_str("/>");
        return;
    }
    out.push('>');

    if let Some(raw) = &element.raw {
        out.push_str(raw);
    } else if let Some(text) = &element.text {
        escape_into(text, out);
    }
    for child in &element.children {
        write_node(child, out);
    }

    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

/// Escape `&`, `<`, `>`, `"` and `'` for text and attribute contexts.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(s, &mut out);
    out
}

fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
}

/// Decode character references in text taken out of markup.
///
/// Covers the references [`escape_html`] emits, `&apos;`, `&nbsp;` and any
/// numeric reference; anything else is kept verbatim.
pub fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;");
        assert_eq!(escape_html("世界"), "世界");
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("Fish &amp; &lt;chips&gt; &#x27;&#39;&quot;"), "Fish & <chips> ''\"");
        assert_eq!(unescape_html("AT&T &unknown; &amp"), "AT&T &unknown; &amp");
        assert_eq!(unescape_html("&#x4e16;&#30028;"), "世界");
        let text = r#"<a href="x">Tom & 'Jerry'</a>"#;
        assert_eq!(unescape_html(&escape_html(text)), text);
    }

    #[test]
    fn test_element_with_text_and_attrs() {
        let node: Node = Element::new("a").class("mw-link").attr("href", "/x?a=1&b=2").text("go <now>").into();
        assert_eq!(
            to_html(&[node]),
            r#"<a class="mw-link" href="/x?a=1&amp;b=2">go &lt;now&gt;</a>"#
        );
    }

    #[test]
    fn test_self_closing() {
        let node: Node = Element::new("img").attr("src", "a.png").attr("alt", "").self_closing().into();
        assert_eq!(to_html(&[node]), r#"<img src="a.png" alt=""/>"#);
    }

    #[test]
    fn test_raw_is_not_escaped() {
        let node: Node = Element::new("div").raw("<b>bold</b>").into();
        assert_eq!(to_html(&[node]), "<div><b>bold</b></div>");
    }

    #[test]
    fn test_nested_children() {
        let node: Node = Element::new("p")
            .children(vec![
                Node::Text("a & ".into()),
                Element::new("a").attr("href", "/b").text("b").into(),
            ])
            .into();
        assert_eq!(to_html(&[node]), r#"<p>a &amp; <a href="/b">b</a></p>"#);
    }
}
