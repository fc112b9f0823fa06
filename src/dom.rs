//! DOM Facade for the HTML rewriter
//!
//! Thin query/mutate layer over html5ever's reference DOM. Only what the
//! rewriter needs is exposed: walk `<script>` elements in document order,
//! read and write their attributes and inline text, append a script to
//! `<body>`, and serialize the tree back to a string.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use tendril::StrTendril;

use crate::error::TransformError;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Which top-level section of the document a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Head,
    Body,
}

/// A parsed HTML document, owned for the duration of one transform.
pub struct HtmlDocument {
    dom: RcDom,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Result<Self, TransformError> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(TransformError::Parse)?;
        Ok(Self { dom })
    }

    /// Every `<script>` element, in document order.
    pub fn scripts(&self) -> Vec<ScriptElement> {
        let mut scripts = Vec::new();
        collect_scripts(&self.dom.document, None, &mut scripts);
        scripts
    }

    /// Scripts accepted by `predicate`, in document order.
    pub fn select_scripts<F>(&self, predicate: F) -> Vec<ScriptElement>
    where
        F: Fn(&ScriptElement) -> bool,
    {
        self.scripts().into_iter().filter(|s| predicate(s)).collect()
    }

    /// Append an inline `<script>` as the last child of `<body>`.
    ///
    /// Returns `None` only for a tree without a body, which html5ever never
    /// produces for a full document parse.
    pub fn append_body_script(&mut self, code: &str) -> Option<ScriptElement> {
        let body = find_element(&self.dom.document, "body")?;
        let script = self.dom.create_element(
            html_name("script"),
            Vec::new(),
            ElementFlags::default(),
        );
        self.dom.append(&body, NodeOrText::AppendNode(script.clone()));

        let element = ScriptElement {
            handle: script,
            region: Some(Region::Body),
        };
        element.set_text(code);
        Some(element)
    }

    pub fn to_html(&self) -> Result<String, TransformError> {
        let mut out = Vec::new();
        let document: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut out, &document, SerializeOpts::default())
            .map_err(TransformError::Serialize)?;
        Ok(String::from_utf8(out)?)
    }
}

/// Handle to a `<script>` element inside an [`HtmlDocument`].
///
/// Cloning the handle does not clone the element: every clone mutates the
/// same node in the tree.
#[derive(Clone)]
pub struct ScriptElement {
    handle: Handle,
    region: Option<Region>,
}

impl ScriptElement {
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        let attrs = self.attrs()?;
        let attrs = attrs.borrow();
        attrs
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        let Some(attrs) = self.attrs() else {
            return;
        };
        let mut attrs = attrs.borrow_mut();
        let value = StrTendril::from_slice(value);
        match attrs.iter_mut().find(|a| &*a.name.local == name) {
            Some(existing) => existing.value = value,
            None => attrs.push(Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                value,
            }),
        }
    }

    pub fn remove_attr(&self, name: &str) {
        if let Some(attrs) = self.attrs() {
            attrs.borrow_mut().retain(|a| &*a.name.local != name);
        }
    }

    /// `type="module"`, compared exactly like an attribute selector would.
    pub fn is_module(&self) -> bool {
        self.attr("type").as_deref() == Some("module")
    }

    /// Concatenated text of the element's direct text children.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in self.handle.children.borrow().iter() {
            if let NodeData::Text { contents } = &child.data {
                text.push_str(&contents.borrow());
            }
        }
        text
    }

    /// Replace all children with a single text node.
    pub fn set_text(&self, text: &str) {
        let mut children = self.handle.children.borrow_mut();
        for child in children.drain(..) {
            child.parent.set(None);
        }
        if text.is_empty() {
            return;
        }
        let node = Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from_slice(text)),
        });
        node.parent.set(Some(Rc::downgrade(&self.handle)));
        children.push(node);
    }

    /// Whether both handles point at the same node.
    pub fn same_node(&self, other: &ScriptElement) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }

    fn attrs(&self) -> Option<&RefCell<Vec<Attribute>>> {
        match &self.handle.data {
            NodeData::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ScriptElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptElement")
            .field("region", &self.region)
            .field("src", &self.attr("src"))
            .field("type", &self.attr("type"))
            .finish()
    }
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn collect_scripts(handle: &Handle, region: Option<Region>, out: &mut Vec<ScriptElement>) {
    for child in handle.children.borrow().iter() {
        let mut child_region = region;
        if let NodeData::Element { name, .. } = &child.data {
            match &*name.local {
                "head" => child_region = Some(Region::Head),
                "body" => child_region = Some(Region::Body),
                "script" => out.push(ScriptElement {
                    handle: child.clone(),
                    region,
                }),
                _ => {}
            }
        }
        collect_scripts(child, child_region, out);
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            if &*name.local == tag {
                return Some(child.clone());
            }
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}
