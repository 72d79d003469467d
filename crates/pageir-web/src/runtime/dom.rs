//! A small element tree read back from compiled markup.
//!
//! Only what the runtime touches is modelled: attributes, class list, inline
//! style, text, form values and parent links. The parser is lenient and
//! expects the well-formed output of the compiler; stray closing tags are
//! ignored and raw-text elements keep their source verbatim.

use super::RuntimeError;
use crate::compile::VOID_ELEMENTS;
use crate::value::unescape_html;
use indexmap::IndexMap;

const RAW_TEXT: &[&str] = &["script", "style"];
const FORM_CONTROLS: &[&str] = &["input", "select", "textarea"];

pub(crate) const ROOT: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
    Element(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub parent: Option<usize>,
    pub content: Vec<Content>,
    /// Live form value once set by the user or by a binding.
    pub value: Option<String>,
}

impl Element {
    fn new(tag: impl Into<String>, attrs: IndexMap<String, String>, parent: Option<usize>) -> Self {
        Self { tag: tag.into(), attrs, parent, content: Vec::new(), value: None }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dom {
    elements: Vec<Element>,
}

fn malformed(offset: usize, what: &str) -> RuntimeError {
    RuntimeError::Markup(format!("{what} at byte {offset}"))
}

pub(crate) fn parse(html: &str) -> Result<Dom, RuntimeError> {
    let mut dom = Dom { elements: vec![Element::new("#document", IndexMap::new(), None)] };
    let mut stack = vec![ROOT];
    let mut pos = 0;

    while pos < html.len() {
        let rest = &html[pos..];
        let parent = stack.last().copied().unwrap_or(ROOT);

        if let Some(after) = rest.strip_prefix("<!--") {
            let end = after.find("-->").ok_or_else(|| malformed(pos, "unterminated comment"))?;
            pos += 4 + end + 3;
        } else if rest.starts_with("<!") {
            let end = rest.find('>').ok_or_else(|| malformed(pos, "unterminated declaration"))?;
            pos += end + 1;
        } else if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').ok_or_else(|| malformed(pos, "unterminated closing tag"))?;
            let name = after[..end].trim().to_ascii_lowercase();
            if let Some(open) = stack.iter().rposition(|&i| dom.elements[i].tag == name) {
                if open > 0 {
                    stack.truncate(open);
                }
            }
            pos += 2 + end + 1;
        } else if rest.starts_with('<')
            && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            let tag = open_tag(rest).ok_or_else(|| malformed(pos, "unterminated tag"))?;
            let index = dom.append(parent, &tag.name, tag.attrs);
            pos += tag.consumed;

            if RAW_TEXT.contains(&tag.name.as_str()) {
                let body = &html[pos..];
                let close = body.to_ascii_lowercase().find(&format!("</{}", tag.name));
                let text_end = close.unwrap_or(body.len());
                if text_end > 0 {
                    dom.elements[index].content.push(Content::Text(body[..text_end].to_string()));
                }
                pos += match close {
                    Some(at) => body[at..].find('>').map(|gt| at + gt + 1).unwrap_or(body.len()),
                    None => body.len(),
                };
            } else if !tag.self_closing && !VOID_ELEMENTS.contains(&tag.name.as_str()) {
                stack.push(index);
            }
        } else {
            let end = match rest.find('<') {
                Some(0) => rest[1..].find('<').map(|p| p + 1).unwrap_or(rest.len()),
                Some(p) => p,
                None => rest.len(),
            };
            dom.elements[parent].content.push(Content::Text(unescape_html(&rest[..end])));
            pos += end;
        }
    }
    Ok(dom)
}

struct OpenTag {
    name: String,
    attrs: IndexMap<String, String>,
    self_closing: bool,
    consumed: usize,
}

fn open_tag(src: &str) -> Option<OpenTag> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let skip_ws = |mut i: usize| {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        i
    };

    let mut i = 1;
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = src[1..i].to_ascii_lowercase();
    let mut attrs = IndexMap::new();

    loop {
        i = skip_ws(i);
        if i >= len {
            return None;
        }
        match bytes[i] {
            b'>' => return Some(OpenTag { name, attrs, self_closing: false, consumed: i + 1 }),
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(OpenTag { name, attrs, self_closing: true, consumed: i + 2 })
            }
            b'/' | b'=' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let start = i;
        while i < len
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr = src[start..i].to_ascii_lowercase();
        i = skip_ws(i);

        let mut value = String::new();
        if i < len && bytes[i] == b'=' {
            i = skip_ws(i + 1);
            if i < len && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let value_start = i + 1;
                i = value_start;
                while i < len && bytes[i] != quote {
                    i += 1;
                }
                if i >= len {
                    return None;
                }
                value = unescape_html(&src[value_start..i]);
                i += 1;
            } else {
                let value_start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                value = unescape_html(&src[value_start..i]);
            }
        }
        attrs.entry(attr).or_insert(value);
    }
}

impl Dom {
    pub fn get(&self, index: usize) -> &Element {
        &self.elements[index]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn attr(&self, index: usize, name: &str) -> Option<&str> {
        self.elements[index].attr(name)
    }

    pub fn set_attr(&mut self, index: usize, name: &str, value: impl Into<String>) {
        self.elements[index].attrs.insert(name.to_string(), value.into());
    }

    pub fn remove_attr(&mut self, index: usize, name: &str) {
        self.elements[index].attrs.shift_remove(name);
    }

    fn append(&mut self, parent: usize, tag: &str, attrs: IndexMap<String, String>) -> usize {
        let index = self.elements.len();
        self.elements.push(Element::new(tag, attrs, Some(parent)));
        self.elements[parent].content.push(Content::Element(index));
        index
    }

    pub fn create_child(&mut self, parent: usize, tag: &str) -> usize {
        self.append(parent, tag, IndexMap::new())
    }

    pub fn detach(&mut self, index: usize) {
        if let Some(parent) = self.elements[index].parent.take() {
            self.elements[parent].content.retain(|c| *c != Content::Element(index));
        }
    }

    pub fn is_attached(&self, index: usize) -> bool {
        let mut current = index;
        loop {
            if current == ROOT {
                return true;
            }
            match self.elements[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Attached elements in document order.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut pending = vec![ROOT];
        while let Some(index) = pending.pop() {
            if index != ROOT {
                order.push(index);
            }
            for content in self.elements[index].content.iter().rev() {
                if let Content::Element(child) = content {
                    pending.push(*child);
                }
            }
        }
        order
    }

    pub fn find_first(&self, predicate: impl Fn(&Element) -> bool) -> Option<usize> {
        self.preorder().into_iter().find(|&i| predicate(&self.elements[i]))
    }

    /// The element itself or its nearest ancestor satisfying `predicate`.
    pub fn closest(&self, index: usize, predicate: impl Fn(&Element) -> bool) -> Option<usize> {
        let mut current = Some(index);
        while let Some(i) = current.filter(|&i| i != ROOT) {
            if predicate(&self.elements[i]) {
                return Some(i);
            }
            current = self.elements[i].parent;
        }
        None
    }

    pub fn text_content(&self, index: usize) -> String {
        let mut text = String::new();
        self.collect_text(index, &mut text);
        text
    }

    fn collect_text(&self, index: usize, out: &mut String) {
        for content in &self.elements[index].content {
            match content {
                Content::Text(t) => out.push_str(t),
                Content::Element(child) => self.collect_text(*child, out),
            }
        }
    }

    pub fn set_text(&mut self, index: usize, text: &str) {
        let previous = std::mem::take(&mut self.elements[index].content);
        for content in previous {
            if let Content::Element(child) = content {
                self.elements[child].parent = None;
            }
        }
        if !text.is_empty() {
            self.elements[index].content.push(Content::Text(text.to_string()));
        }
    }

    pub fn has_class(&self, index: usize, class: &str) -> bool {
        self.attr(index, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, index: usize, class: &str) {
        if self.has_class(index, class) {
            return;
        }
        let classes = match self.attr(index, "class").filter(|c| !c.trim().is_empty()) {
            Some(existing) => format!("{} {class}", existing.trim()),
            None => class.to_string(),
        };
        self.set_attr(index, "class", classes);
    }

    pub fn remove_class(&mut self, index: usize, class: &str) {
        let Some(existing) = self.attr(index, "class") else { return };
        let kept = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(index, "class", kept);
    }

    fn declarations(&self, index: usize) -> Vec<(String, String)> {
        self.attr(index, "style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .map(|(p, v)| (p.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect()
    }

    pub fn style_property(&self, index: usize, property: &str) -> Option<String> {
        self.declarations(index)
            .into_iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// `el.style[property] = value`; an empty value removes the declaration.
    pub fn set_style_property(&mut self, index: usize, property: &str, value: &str) {
        let mut declarations: Vec<(String, String)> =
            self.declarations(index).into_iter().filter(|(p, _)| p != property).collect();
        if !value.is_empty() {
            declarations.push((property.to_string(), value.to_string()));
        }
        if declarations.is_empty() {
            self.remove_attr(index, "style");
        } else {
            let style = declarations
                .iter()
                .map(|(p, v)| format!("{p}:{v}"))
                .collect::<Vec<_>>()
                .join(";");
            self.set_attr(index, "style", style);
        }
    }

    /// Neither the element nor an ancestor is `display:none` or `hidden`.
    pub fn is_rendered(&self, index: usize) -> bool {
        if !self.is_attached(index) {
            return false;
        }
        let mut current = Some(index);
        while let Some(i) = current.filter(|&i| i != ROOT) {
            let element = &self.elements[i];
            if element.attrs.contains_key("hidden")
                || self.style_property(i, "display").as_deref() == Some("none")
            {
                return false;
            }
            current = element.parent;
        }
        true
    }

    pub fn is_form_control(&self, index: usize) -> bool {
        FORM_CONTROLS.contains(&self.elements[index].tag.as_str())
    }

    pub fn form_value(&self, index: usize) -> String {
        let element = &self.elements[index];
        if let Some(value) = &element.value {
            return value.clone();
        }
        match element.tag.as_str() {
            "select" => {
                let options: Vec<usize> = element
                    .content
                    .iter()
                    .filter_map(|c| match c {
                        Content::Element(i) if self.elements[*i].tag == "option" => Some(*i),
                        _ => None,
                    })
                    .collect();
                options
                    .iter()
                    .find(|&&i| self.elements[i].attrs.contains_key("selected"))
                    .or(options.first())
                    .map(|&i| self.option_value(i))
                    .unwrap_or_default()
            }
            "textarea" => self.text_content(index),
            _ => element.attr("value").unwrap_or_default().to_string(),
        }
    }

    fn option_value(&self, index: usize) -> String {
        match self.attr(index, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(index),
        }
    }

    pub fn set_value(&mut self, index: usize, value: &str) {
        self.elements[index].value = Some(value.to_string());
    }

    /// First element in document order matching a simple selector: compound
    /// selectors of tag, `#id`, `.class` and `[attr]`/`[attr=value]` parts,
    /// joined by descendant combinators.
    pub fn query_selector(&self, selector: &str) -> Option<usize> {
        let compounds: Vec<Compound> =
            selector.split_whitespace().map(Compound::parse).collect::<Option<_>>()?;
        let (last, ancestors) = compounds.split_last()?;
        self.preorder().into_iter().find(|&index| {
            if !last.matches(&self.elements[index]) {
                return false;
            }
            let mut remaining: Vec<&Compound> = ancestors.iter().collect();
            let mut current = self.elements[index].parent;
            while let Some(i) = current.filter(|&i| i != ROOT) {
                if remaining.is_empty() {
                    break;
                }
                if remaining.last().is_some_and(|next| next.matches(&self.elements[i])) {
                    remaining.pop();
                }
                current = self.elements[i].parent;
            }
            remaining.is_empty()
        })
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl Compound {
    fn parse(src: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = src;
        let take_ident = |s: &str| -> (String, usize) {
            let end = s.find(|c: char| !is_ident(c)).unwrap_or(s.len());
            (s[..end].to_string(), end)
        };

        if rest.starts_with('*') {
            rest = &rest[1..];
        } else if rest.starts_with(is_ident) {
            let (tag, end) = take_ident(rest);
            compound.tag = Some(tag.to_ascii_lowercase());
            rest = &rest[end..];
        }

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('#') {
                let (id, end) = take_ident(after);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('.') {
                let (class, end) = take_ident(after);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']')?;
                let inner = &after[..close];
                let attr = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        (name.trim().to_ascii_lowercase(), Some(value.to_string()))
                    }
                    None => (inner.trim().to_ascii_lowercase(), None),
                };
                if attr.0.is_empty() {
                    return None;
                }
                compound.attrs.push(attr);
                rest = &after[close + 1..];
            } else {
                return None;
            }
        }
        Some(compound)
    }

    fn matches(&self, element: &Element) -> bool {
        if self.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
            return false;
        }
        if self.id.as_ref().is_some_and(|id| element.attr("id") != Some(id.as_str())) {
            return false;
        }
        let classes: Vec<&str> =
            element.attr("class").unwrap_or_default().split_whitespace().collect();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match (element.attr(name), value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_id(dom: &Dom, id: &str) -> usize {
        dom.find_first(|el| el.attr("data-ir-id") == Some(id)).expect("element")
    }

    #[test]
    fn parses_nested_markup() {
        let dom = parse(
            "<!DOCTYPE html>\n<html><body><div data-ir-id=\"a\" class=\"x y\"><p data-ir-id=\"t\">a &lt; b</p><img src=\"/i.png\" data-ir-id=\"i\"><span data-ir-id=\"s\">after</span></div></body></html>",
        )
        .expect("parse");
        let a = by_id(&dom, "a");
        assert_eq!(dom.text_content(a), "a < bafter");
        let s = by_id(&dom, "s");
        assert_eq!(dom.get(s).parent, Some(a));
        assert!(dom.has_class(a, "y"));
        assert_eq!(dom.attr(by_id(&dom, "i"), "src"), Some("/i.png"));
    }

    #[test]
    fn raw_text_and_attribute_json() {
        let dom = parse(
            "<script id=\"rt\">if (a < b && c) { x('</div>'); }</script><button data-ir-events=\"[{&quot;event&quot;:&quot;click&quot;}]\" disabled>Go</button>",
        )
        .expect("parse");
        let script = dom.find_first(|el| el.tag == "script").expect("script");
        assert_eq!(dom.text_content(script), "if (a < b && c) { x('</div>'); }");
        let button = dom.find_first(|el| el.tag == "button").expect("button");
        assert_eq!(dom.attr(button, "data-ir-events"), Some("[{\"event\":\"click\"}]"));
        assert_eq!(dom.attr(button, "disabled"), Some(""));
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert!(matches!(parse("<div class=\"a"), Err(RuntimeError::Markup(_))));
    }

    #[test]
    fn style_and_class_edits() {
        let mut dom =
            parse("<div data-ir-id=\"d\" style=\"color:red;display:none\"></div>").expect("parse");
        let d = by_id(&dom, "d");
        assert!(!dom.is_rendered(d));
        dom.set_style_property(d, "display", "");
        assert!(dom.is_rendered(d));
        assert_eq!(dom.attr(d, "style"), Some("color:red"));
        dom.add_class(d, "ir-motion-fadeIn");
        dom.add_class(d, "ir-motion-fadeIn");
        assert_eq!(dom.attr(d, "class"), Some("ir-motion-fadeIn"));
        dom.remove_class(d, "ir-motion-fadeIn");
        assert!(!dom.has_class(d, "ir-motion-fadeIn"));
    }

    #[test]
    fn form_values() {
        let dom = parse(
            "<input data-ir-id=\"i\" value=\"hi\"><select data-ir-id=\"s\"><option value=\"a\">A</option><option value=\"b\" selected>B</option></select>",
        )
        .expect("parse");
        assert_eq!(dom.form_value(by_id(&dom, "i")), "hi");
        assert_eq!(dom.form_value(by_id(&dom, "s")), "b");
    }

    #[test]
    fn selectors() {
        let dom = parse(
            "<form class=\"f\"><input name=\"email\" data-ir-id=\"e\"><input name=\"pw\" id=\"pw\" data-ir-id=\"p\"></form><input name=\"email\" data-ir-id=\"o\">",
        )
        .expect("parse");
        assert_eq!(dom.query_selector("#pw"), Some(by_id(&dom, "p")));
        assert_eq!(dom.query_selector("input[name=\"email\"]"), Some(by_id(&dom, "e")));
        assert_eq!(dom.query_selector(".f [data-ir-id='p']"), Some(by_id(&dom, "p")));
        assert_eq!(dom.query_selector("section input"), None);
        assert_eq!(dom.query_selector("input > p"), None);
    }
}
