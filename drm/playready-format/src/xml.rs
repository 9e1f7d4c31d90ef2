/*!
    Ordered XML element tree and its canonical serialization.

    Every digest and signature in a license challenge is computed over the
    canonical form produced here:
    - no whitespace between tags
    - attributes in insertion order
    - explicit end tags, even for empty elements (`<a></a>`, never `<a/>`)
    - text escaped as `&amp;` `&lt;` `&gt;` `&#xD;`
    - attribute values escaped as `&amp;` `&lt;` `&quot;` `&#x9;` `&#xA;` `&#xD;`

    Trees that are structurally identical always serialize to identical bytes.
*/

use core::fmt::{self, Write};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{FormatError, FormatResult};

/**
    A child of an [`Element`].
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, escaped on output.
    Text(String),
    /// Pre-serialized markup, written out verbatim.
    Raw(String),
}

/**
    An XML element with ordered attributes and children.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /**
        Append an attribute. Attributes are written in the order they were added.
    */
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /**
        Iterate over the direct child elements, skipping text and raw nodes.
    */
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /**
        First direct child element with the given name.
    */
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /**
        Depth-first search for the first element with the given name,
        starting with `self`.
    */
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|e| e.find(name))
    }

    /**
        All elements with the given name, in document order, including `self`.
    */
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        if self.name == name {
            found.push(self);
        }
        for child in self.child_elements() {
            child.collect_named(name, found);
        }
    }

    /**
        Concatenated direct text content (raw and element children are ignored).
    */
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /**
        Serialize this element and its subtree in canonical form.
    */
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }

    /**
        Parse a single-rooted XML document into an element tree.

        The XML declaration, comments and processing instructions are skipped,
        and whitespace-only text nodes (indentation) are dropped, so an
        indented document parses to the same tree as its compact form.
    */
    pub fn parse(xml: &str) -> FormatResult<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(element_from_start(&e)?),
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| FormatError::InvalidXml("unbalanced end tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| FormatError::InvalidXml(e.to_string()))?;
                    push_text(&mut stack, &text)?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| FormatError::InvalidXml(e.to_string()))?;
                    push_text(&mut stack, &text)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(FormatError::InvalidXml(e.to_string())),
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(FormatError::InvalidXml(format!(
                "element <{}> is never closed",
                open.name
            )));
        }

        root.ok_or_else(|| FormatError::InvalidXml("document has no root element".into()))
    }
}

impl fmt::Display for Element {
    /**
        Writes the canonical form.
    */
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"")?;
            write_escaped_attr(f, value)?;
            f.write_char('"')?;
        }
        f.write_char('>')?;

        for child in &self.children {
            match child {
                Node::Element(e) => fmt::Display::fmt(e, f)?,
                Node::Text(t) => write_escaped_text(f, t)?,
                Node::Raw(r) => f.write_str(r)?,
            }
        }

        write!(f, "</{}>", self.name)
    }
}

fn write_escaped_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '\r' => f.write_str("&#xD;")?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

fn write_escaped_attr(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '"' => f.write_str("&quot;")?,
            '\t' => f.write_str("&#x9;")?,
            '\n' => f.write_str("&#xA;")?,
            '\r' => f.write_str("&#xD;")?,
            _ => f.write_char(c)?,
        }
    }
    Ok(())
}

fn element_from_start(start: &BytesStart<'_>) -> FormatResult<Element> {
    let name = utf8(start.name().as_ref())?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FormatError::InvalidXml(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| FormatError::InvalidXml(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> FormatResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else if root.is_some() {
        return Err(FormatError::InvalidXml(
            "document has more than one root element".into(),
        ));
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> FormatResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Text(text.to_owned()));
            Ok(())
        }
        None => Err(FormatError::InvalidXml(
            "text outside of the root element".into(),
        )),
    }
}

fn utf8(bytes: &[u8]) -> FormatResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| FormatError::InvalidXml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("Root")
            .with_attr("xmlns", "urn:test")
            .with_attr("Id", "A")
            .with_child(Element::new("Empty"))
            .with_child(Element::new("Value").with_text("42"))
    }

    #[test]
    fn canonical_form_has_explicit_end_tags() {
        assert_eq!(
            sample().to_canonical_string(),
            "<Root xmlns=\"urn:test\" Id=\"A\"><Empty></Empty><Value>42</Value></Root>"
        );
    }

    #[test]
    fn canonical_form_is_deterministic() {
        assert_eq!(sample().to_canonical_string(), sample().to_canonical_string());
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let xml = Element::new("a")
            .with_attr("z", "1")
            .with_attr("b", "2")
            .to_canonical_string();
        assert_eq!(xml, "<a z=\"1\" b=\"2\"></a>");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let xml = Element::new("a")
            .with_attr("q", "say \"hi\" & <bye>")
            .with_text("x & y < z > w")
            .to_canonical_string();
        assert_eq!(
            xml,
            "<a q=\"say &quot;hi&quot; &amp; &lt;bye>\">x &amp; y &lt; z &gt; w</a>"
        );
    }

    #[test]
    fn text_padding_is_preserved() {
        let xml = Element::new("a").with_text(" abc ").to_canonical_string();
        assert_eq!(xml, "<a> abc </a>");
    }

    #[test]
    fn raw_nodes_are_written_verbatim() {
        let xml = Element::new("a")
            .with_node(Node::Raw("<b x=\"1\"></b>".into()))
            .to_canonical_string();
        assert_eq!(xml, "<a><b x=\"1\"></b></a>");
    }

    #[test]
    fn parse_indented_matches_compact() {
        let indented = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <Root xmlns=\"urn:test\" Id=\"A\">\n   <Empty/>\n   <Value>42</Value>\n</Root>\n";
        let parsed = Element::parse(indented).unwrap();
        assert_eq!(parsed, sample());
        assert!(!parsed.to_canonical_string().contains('\n'));
    }

    #[test]
    fn parse_round_trips_escaped_content() {
        let original = Element::new("a")
            .with_attr("xml:space", "preserve")
            .with_text("1 & 2");
        let parsed = Element::parse(&original.to_canonical_string()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn find_searches_depth_first() {
        let tree = Element::new("a").with_child(
            Element::new("b")
                .with_child(Element::new("c").with_text("first"))
                .with_child(Element::new("c").with_text("second")),
        );
        assert_eq!(tree.find("c").unwrap().text(), "first");
        assert_eq!(tree.find_all("c").len(), 2);
        assert!(tree.find("missing").is_none());
        assert_eq!(tree.child("b").unwrap().name(), "b");
        assert!(tree.child("c").is_none());
    }

    #[test]
    fn parse_rejects_mismatched_tags() {
        let err = Element::parse("<a><b></a></b>").unwrap_err();
        assert!(matches!(err, FormatError::InvalidXml(_)));
    }

    #[test]
    fn parse_rejects_unclosed_root() {
        let err = Element::parse("<a><b></b>").unwrap_err();
        assert!(matches!(err, FormatError::InvalidXml(_)));
    }

    #[test]
    fn parse_rejects_multiple_roots() {
        let err = Element::parse("<a></a><b></b>").unwrap_err();
        assert!(matches!(err, FormatError::InvalidXml(_)));
    }

    #[test]
    fn parse_rejects_empty_document() {
        let err = Element::parse("  ").unwrap_err();
        assert!(matches!(err, FormatError::InvalidXml(_)));
    }
}
