//! Arena-allocated DOM tree.
//!
//! Nodes live in a single `Vec` and link to each other by [`NodeId`]. Detached
//! nodes stay in the arena until the tree is dropped, so ids never dangle.

/// Index of a node in its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Tag name and attributes of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// An owned, mutable HTML document fragment.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only an empty document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// The document node every fragment hangs from.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node::new(data));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_element_with_attrs(&mut self, name: &str, attrs: Vec<(String, String)>) -> NodeId {
        let mut data = ElementData::new(name);
        data.attrs = attrs;
        self.alloc(NodeData::Element(data))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.node_mut(id).data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Direct children, collected so the caller may mutate while iterating.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut next = self.first_child(id);
        while let Some(child) = next {
            out.push(child);
            next = self.next_sibling(child);
        }
        out
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.first_child(id).is_some()
    }

    /// All descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Descendants with children before their parents, excluding `id` itself.
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.children(id) {
            out.extend(self.post_order(child));
            out.push(child);
        }
        out
    }

    /// Ancestors from the parent up to the document node.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut next = self.parent(id);
        while let Some(parent) = next {
            out.push(parent);
            next = self.parent(parent);
        }
        out
    }

    /// Whether the node is still connected to the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).last() == Some(&self.root())
    }

    /// Unlinks a node (and its subtree) from its parent and siblings.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if let Some(prev) = prev {
            self.node_mut(prev).next_sibling = next;
        } else if let Some(parent) = parent {
            self.node_mut(parent).first_child = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev_sibling = prev;
        } else if let Some(parent) = parent {
            self.node_mut(parent).last_child = prev;
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Removes a node from the tree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    /// Appends `child` as the last child of `parent`, moving it if attached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.node(parent).last_child;
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
        }
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Inserts `child` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) {
        match self.first_child(parent) {
            Some(first) => self.insert_before(first, child),
            None => self.append(parent, child),
        }
    }

    /// Inserts `new` immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        if reference == new {
            return;
        }
        self.detach(new);
        let (parent, prev) = {
            let node = self.node(reference);
            (node.parent, node.prev_sibling)
        };
        {
            let node = self.node_mut(new);
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = Some(reference);
        }
        self.node_mut(reference).prev_sibling = Some(new);
        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = Some(new);
                }
            }
        }
    }

    /// Inserts `new` immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, new),
            None => {
                if let Some(parent) = self.parent(reference) {
                    self.append(parent, new);
                }
            }
        }
    }

    /// Puts `new` where `old` was and detaches `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Moves every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.children(from) {
            self.append(to, child);
        }
    }

    /// Replaces an element with its children.
    pub fn unwrap(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.insert_before(id, child);
        }
        self.detach(id);
    }

    /// Puts `wrapper` where `id` was and moves `id` inside it.
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) {
        self.insert_before(id, wrapper);
        self.append(wrapper, id);
    }

    /// Creates an element named `name` with the attributes and children of
    /// `id`, puts it in place of `id` and returns it.
    pub fn rename(&mut self, id: NodeId, name: &str) -> NodeId {
        let attrs = self
            .element(id)
            .map(|e| e.attrs.clone())
            .unwrap_or_default();
        let new = self.create_element_with_attrs(name, attrs);
        self.move_children(id, new);
        self.replace(id, new);
        new
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.data_mut(id) {
            NodeData::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Comment(_))
    }

    /// Lowercase tag name of an element node.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag_name(id) == Some(name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.element_mut(id) {
            match element.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, existing)) => *existing = value,
                None => element.attrs.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(k, _)| k != name);
        }
    }

    /// Keeps only the attributes accepted by `keep`.
    pub fn retain_attrs(&mut self, id: NodeId, mut keep: impl FnMut(&str, &str) -> bool) {
        if let Some(element) = self.element_mut(id) {
            element.attrs.retain(|(k, v)| keep(k, v));
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|e| e.classes().any(|c| c == class))
    }

    /// Content of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) | NodeData::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeData::Text(text) | NodeData::Comment(text) = self.data_mut(id) {
            *text = value.into();
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let NodeData::Text(text) = self.data(id) {
            return text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.data(n) {
                NodeData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Copies the subtree rooted at `id` from `source` into this tree,
    /// returning the detached copy.
    pub fn import(&mut self, source: &Tree, id: NodeId) -> NodeId {
        let copy = self.alloc(source.data(id).clone());
        for child in source.children(id) {
            let child_copy = self.import(source, child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Copies the subtree rooted at `id` within this tree.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.alloc(self.data(id).clone());
        for child in self.children(id) {
            let child_copy = self.deep_clone(child);
            self.append(copy, child_copy);
        }
        copy
    }

    /// Merges adjacent text nodes and drops empty ones below `id`.
    pub fn normalize(&mut self, id: NodeId) {
        for node in self.post_order(id) {
            if !self.is_text(node) || !self.is_attached_below(node, id) {
                continue;
            }
            while let Some(next) = self.next_sibling(node) {
                let Some(next_text) = (match self.data(next) {
                    NodeData::Text(t) => Some(t.clone()),
                    _ => None,
                }) else {
                    break;
                };
                if let NodeData::Text(text) = self.data_mut(node) {
                    text.push_str(&next_text);
                }
                self.detach(next);
            }
            if self.text(node).is_some_and(str::is_empty) {
                self.detach(node);
            }
        }
    }

    fn is_attached_below(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }
}
