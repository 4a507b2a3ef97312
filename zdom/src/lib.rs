//! Tiny and opinionated document model.
//!
//! Elements live in an arena owned by [`Document`] and are addressed by
//! [`ElementId`]. Only elements reachable from the root are visible to
//! queries. Removing or replacing a child destroys its whole subtree: the
//! slots are reused, and the old ids go stale and resolve to nothing.

use std::{
    error::Error as StdError,
    fmt::{self, Debug},
    rc::Rc,
};

use log::{debug, trace};

pub use crate::css::{Color, Rule};

pub mod css;

pub type Result<T = ()> = std::result::Result<T, Error>;

/// What a listener returns. Any error stops the dispatch.
pub type HandlerResult = std::result::Result<(), Box<dyn StdError>>;

pub type Listener = Rc<dyn Fn(&mut Document, &Event) -> HandlerResult>;

#[derive(Debug)]
pub enum Error {
    NoSuchElement(ElementId),
    NotAChild {
        parent: ElementId,
        child: ElementId,
    },
    HierarchyRequest {
        parent: ElementId,
        child: ElementId,
    },
    Handler(Box<dyn StdError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoSuchElement(id) => write!(f, "No such element: {:?}", id),
            Error::NotAChild { parent, child } => {
                write!(f, "{:?} is not a child of {:?}", child, parent)
            }
            Error::HierarchyRequest { parent, child } => {
                write!(f, "Can't insert {:?} into its own subtree {:?}", child, parent)
            }
            Error::Handler(e) => write!(f, "Event handler failed: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Handler(e) => Some(&**e),
            Error::NoSuchElement(_) | Error::NotAChild { .. } | Error::HierarchyRequest { .. } => {
                None
            }
        }
    }
}

/// Slot index plus the generation of the slot when the element was created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: usize,
    generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    MouseOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,

    /// The element the event was dispatched to.
    pub target: ElementId,

    /// The element whose listener is running right now.
    pub current_target: ElementId,
}

/// Identifies one registered listener. Removing it twice is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    element: ElementId,
    serial: u64,
}

struct RegisteredListener {
    serial: u64,
    kind: EventKind,
    listener: Listener,
}

impl Debug for RegisteredListener {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RegisteredListener")
            .field("serial", &self.serial)
            .field("kind", &self.kind)
            .field("listener", &format_args!("{:p}", self.listener))
            .finish()
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    listeners: Vec<RegisteredListener>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: ElementId,
    next_serial: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = Slot {
            generation: 0,
            node: Some(Node::new("body")),
        };
        Self {
            slots: vec![root],
            free: Vec::new(),
            root: ElementId {
                index: 0,
                generation: 0,
            },
            next_serial: 0,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Number of live elements, attached or not.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn node(&self, el: ElementId) -> Result<&Node> {
        self.slots
            .get(el.index)
            .filter(|slot| slot.generation == el.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(Error::NoSuchElement(el))
    }

    fn node_mut(&mut self, el: ElementId) -> Result<&mut Node> {
        self.slots
            .get_mut(el.index)
            .filter(|slot| slot.generation == el.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(Error::NoSuchElement(el))
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let node = Some(Node::new(tag));
        let el = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = node;
                ElementId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node,
                });
                ElementId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        trace!("Document: create_element {:?} <{}>", el, tag);
        el
    }

    /// Drops a detached element with its subtree and listeners.
    fn destroy(&mut self, el: ElementId) {
        let mut stack = vec![el];
        let mut destroyed = 0;
        while let Some(current) = stack.pop() {
            if self.node(current).is_err() {
                continue;
            }
            let slot = &mut self.slots[current.index];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
            destroyed += 1;
        }
        trace!("Document: destroyed {:?} ({} nodes)", el, destroyed);
    }

    pub fn tag(&self, el: ElementId) -> Option<&str> {
        self.node(el).ok().map(|node| node.tag.as_str())
    }

    pub fn id(&self, el: ElementId) -> Option<&str> {
        self.node(el).ok().and_then(|node| node.id.as_deref())
    }

    pub fn set_id(&mut self, el: ElementId, id: &str) -> Result {
        self.node_mut(el)?.id = Some(id.to_string());
        Ok(())
    }

    pub fn classes(&self, el: ElementId) -> &[String] {
        self.node(el).map(|node| &node.classes[..]).unwrap_or(&[])
    }

    pub fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.classes(el).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, el: ElementId, class: &str) -> Result {
        let node = self.node_mut(el)?;
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    pub fn text(&self, el: ElementId) -> &str {
        self.node(el).map(|node| node.text.as_str()).unwrap_or("")
    }

    /// Replaces the whole text content.
    pub fn set_text(&mut self, el: ElementId, text: &str) -> Result {
        let node = self.node_mut(el)?;
        node.text.clear();
        node.text.push_str(text);
        Ok(())
    }

    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.node(el).ok().and_then(|node| node.parent)
    }

    pub fn children(&self, el: ElementId) -> &[ElementId] {
        self.node(el).map(|node| &node.children[..]).unwrap_or(&[])
    }

    /// Returns true if the element is reachable from the root.
    pub fn is_attached(&self, el: ElementId) -> bool {
        let mut current = el;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut current = Some(el);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    fn detach(&mut self, el: ElementId) -> Result {
        if let Some(parent) = self.node(el)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != el);
            self.node_mut(el)?.parent = None;
        }
        Ok(())
    }

    /// Moves `child` under `parent`, detaching it from its old parent first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result {
        self.node(parent)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::HierarchyRequest { parent, child });
        }
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Removes `child` and destroys it together with its subtree.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result {
        if self.node(child)?.parent != Some(parent) {
            return Err(Error::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.destroy(child);
        Ok(())
    }

    /// Puts `new` in the place of `old` and destroys `old` with its subtree.
    pub fn replace_child(&mut self, parent: ElementId, new: ElementId, old: ElementId) -> Result {
        if self.node(old)?.parent != Some(parent) {
            return Err(Error::NotAChild { parent, child: old });
        }
        if new == old {
            return Ok(());
        }
        if self.is_inclusive_ancestor(new, parent) {
            return Err(Error::HierarchyRequest { parent, child: new });
        }
        self.detach(new)?;
        let children = &mut self.node_mut(parent)?.children;
        let index = children
            .iter()
            .position(|&c| c == old)
            .ok_or(Error::NotAChild { parent, child: old })?;
        children[index] = new;
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(old)?.parent = None;
        self.destroy(old);
        Ok(())
    }

    /// Deep copy of the element and its subtree, without any listeners.
    /// The copy is detached.
    pub fn clone_node(&mut self, el: ElementId) -> Result<ElementId> {
        let (tag, id, classes, text, children) = {
            let node = self.node(el)?;
            (
                node.tag.clone(),
                node.id.clone(),
                node.classes.clone(),
                node.text.clone(),
                node.children.clone(),
            )
        };
        let copy = self.create_element(&tag);
        {
            let node = self.node_mut(copy)?;
            node.id = id;
            node.classes = classes;
            node.text = text;
        }
        for child in children {
            let child_copy = self.clone_node(child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    /// Attached elements in document order, starting with the root.
    fn attached(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(self.children(el).iter().rev());
        }
        out
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        self.attached()
            .into_iter()
            .find(|&el| self.id(el) == Some(id))
    }

    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<ElementId> {
        self.attached()
            .into_iter()
            .filter(|&el| self.has_class(el, class))
            .collect()
    }

    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<ElementId> {
        self.attached()
            .into_iter()
            .filter(|&el| self.tag(el) == Some(tag))
            .collect()
    }

    pub fn add_event_listener(
        &mut self,
        el: ElementId,
        kind: EventKind,
        listener: Listener,
    ) -> Result<ListenerHandle> {
        let serial = self.next_serial;
        self.node_mut(el)?.listeners.push(RegisteredListener {
            serial,
            kind,
            listener,
        });
        self.next_serial += 1;
        Ok(ListenerHandle {
            element: el,
            serial,
        })
    }

    /// Returns false if the listener was already gone.
    pub fn remove_event_listener(&mut self, handle: ListenerHandle) -> bool {
        match self.node_mut(handle.element) {
            Ok(node) => {
                let len_before = node.listeners.len();
                node.listeners.retain(|l| l.serial != handle.serial);
                node.listeners.len() != len_before
            }
            Err(_) => false,
        }
    }

    pub fn listener_count(&self, el: ElementId, kind: EventKind) -> usize {
        self.node(el)
            .map(|node| node.listeners.iter().filter(|l| l.kind == kind).count())
            .unwrap_or(0)
    }

    /// Runs the listeners of `target` and then of each of its ancestors.
    ///
    /// The propagation path and each node's listener list are captured
    /// before the listeners run, so listeners are free to mutate the
    /// document or dispatch nested events.
    pub fn dispatch(&mut self, target: ElementId, kind: EventKind) -> Result {
        self.node(target)?;
        let mut path = vec![target];
        while let Some(parent) = self.parent(path[path.len() - 1]) {
            path.push(parent);
        }
        debug!("Document: dispatch {:?} to {:?}", kind, target);
        for current_target in path {
            // An earlier listener may have destroyed this part of the path.
            let node = match self.node(current_target) {
                Ok(node) => node,
                Err(_) => continue,
            };
            let listeners: Vec<Listener> = node
                .listeners
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| l.listener.clone())
                .collect();
            let event = Event {
                kind,
                target,
                current_target,
            };
            for listener in listeners {
                listener(self, &event).map_err(Error::Handler)?;
            }
        }
        Ok(())
    }

    pub fn click(&mut self, el: ElementId) -> Result {
        self.dispatch(el, EventKind::Click)
    }

    pub fn mouse_over(&mut self, el: ElementId) -> Result {
        self.dispatch(el, EventKind::MouseOver)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    fn div(doc: &mut Document, parent: ElementId, id: &str) -> ElementId {
        let el = doc.create_element("div");
        doc.set_id(el, id).unwrap();
        doc.append_child(parent, el).unwrap();
        el
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Listener {
        let log = log.clone();
        Rc::new(move |doc: &mut Document, event: &Event| -> HandlerResult {
            let target = doc.id(event.target).unwrap_or("").to_string();
            log.borrow_mut().push(format!("{}:{}", name, target));
            Ok(())
        })
    }

    #[test]
    fn queries_see_only_attached_elements_in_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        let b = div(&mut doc, a, "b");
        let c = div(&mut doc, root, "c");
        for &el in &[a, b, c] {
            doc.add_class(el, "cell").unwrap();
        }
        assert_eq!(doc.get_elements_by_class_name("cell"), vec![a, b, c]);
        doc.remove_child(root, a).unwrap();
        assert_eq!(doc.get_elements_by_class_name("cell"), vec![c]);
        assert_eq!(doc.get_element_by_id("b"), None);
        assert!(!doc.is_attached(b));
        assert_eq!(doc.get_element_by_id("c"), Some(c));
    }

    #[test]
    fn removed_subtree_is_destroyed_and_its_ids_go_stale() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        let b = div(&mut doc, a, "b");
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = doc
            .add_event_listener(b, EventKind::Click, recorder(&log, "b"))
            .unwrap();
        assert_eq!(doc.node_count(), 3);
        assert_eq!(Rc::strong_count(&log), 2);

        doc.remove_child(root, a).unwrap();
        assert_eq!(doc.node_count(), 1);
        assert_eq!(Rc::strong_count(&log), 1);
        assert_eq!(doc.id(b), None);
        assert!(!doc.remove_event_listener(handle));
        assert!(matches!(doc.click(b), Err(Error::NoSuchElement(_))));

        let c = div(&mut doc, root, "c");
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(doc.id(a), None);
        assert_eq!(doc.id(c), Some("c"));
    }

    #[test]
    fn node_count_stays_flat_when_children_are_replaced_over_and_over() {
        let mut doc = Document::new();
        let root = doc.root();
        let mut current = div(&mut doc, root, "cell");
        div(&mut doc, current, "inner");
        let count = doc.node_count();
        for _ in 0..100 {
            let copy = doc.clone_node(current).unwrap();
            doc.replace_child(root, copy, current).unwrap();
            current = copy;
        }
        assert_eq!(doc.node_count(), count);
        assert_eq!(doc.get_element_by_id("cell"), Some(current));
        assert_eq!(doc.children(current).len(), 1);
    }

    #[test]
    fn add_class_does_not_duplicate() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "x").unwrap();
        doc.add_class(el, "x").unwrap();
        assert_eq!(doc.classes(el).len(), 1);
    }

    #[test]
    fn append_into_own_subtree_fails() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        let b = div(&mut doc, a, "b");
        assert!(matches!(
            doc.append_child(b, a),
            Err(Error::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn clone_node_is_deep_and_has_no_listeners() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        doc.add_class(a, "square").unwrap();
        doc.set_text(a, "hi").unwrap();
        let _child = div(&mut doc, a, "child");
        let log = Rc::new(RefCell::new(Vec::new()));
        doc.add_event_listener(a, EventKind::Click, recorder(&log, "a"))
            .unwrap();

        let copy = doc.clone_node(a).unwrap();
        assert!(!doc.is_attached(copy));
        assert_eq!(doc.id(copy), Some("a"));
        assert_eq!(doc.text(copy), "hi");
        assert!(doc.has_class(copy, "square"));
        assert_eq!(doc.children(copy).len(), 1);
        assert_eq!(doc.listener_count(copy, EventKind::Click), 0);

        doc.replace_child(root, copy, a).unwrap();
        assert!(doc.is_attached(copy));
        assert!(!doc.is_attached(a));
        assert_eq!(doc.get_element_by_id("a"), Some(copy));
        assert_eq!(doc.children(root), &[copy][..]);
    }

    #[test]
    fn replace_child_checks_parent() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        let b = div(&mut doc, a, "b");
        let c = doc.create_element("div");
        assert!(matches!(
            doc.replace_child(root, c, b),
            Err(Error::NotAChild { .. })
        ));
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = div(&mut doc, root, "outer");
        let inner = div(&mut doc, outer, "inner");
        let log = Rc::new(RefCell::new(Vec::new()));
        doc.add_event_listener(outer, EventKind::Click, recorder(&log, "outer"))
            .unwrap();
        doc.add_event_listener(inner, EventKind::Click, recorder(&log, "inner"))
            .unwrap();
        doc.add_event_listener(inner, EventKind::MouseOver, recorder(&log, "over"))
            .unwrap();
        doc.click(inner).unwrap();
        assert_eq!(*log.borrow(), vec!["inner:inner", "outer:inner"]);
    }

    #[test]
    fn removed_listener_does_not_run() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = doc
            .add_event_listener(a, EventKind::MouseOver, recorder(&log, "a"))
            .unwrap();
        assert_eq!(doc.listener_count(a, EventKind::MouseOver), 1);
        assert!(doc.remove_event_listener(handle));
        assert!(!doc.remove_event_listener(handle));
        doc.mouse_over(a).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn listeners_can_dispatch_nested_events() {
        let mut doc = Document::new();
        let root = doc.root();
        let button = div(&mut doc, root, "button");
        let cell = div(&mut doc, root, "cell");
        let log = Rc::new(RefCell::new(Vec::new()));
        doc.add_event_listener(button, EventKind::Click, recorder(&log, "button"))
            .unwrap();
        let forward: Listener = Rc::new(move |doc: &mut Document, _: &Event| -> HandlerResult {
            doc.click(button)?;
            Ok(())
        });
        doc.add_event_listener(cell, EventKind::Click, forward)
            .unwrap();
        doc.click(cell).unwrap();
        assert_eq!(*log.borrow(), vec!["button:button"]);
    }

    #[test]
    fn handler_error_stops_propagation() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = div(&mut doc, root, "a");
        let log = Rc::new(RefCell::new(Vec::new()));
        doc.add_event_listener(root, EventKind::Click, recorder(&log, "root"))
            .unwrap();
        let failing: Listener = Rc::new(|_: &mut Document, _: &Event| -> HandlerResult {
            Err("nope".into())
        });
        doc.add_event_listener(a, EventKind::Click, failing).unwrap();
        let err = doc.click(a).unwrap_err();
        assert_eq!(err.to_string(), "Event handler failed: nope");
        assert!(log.borrow().is_empty());
    }
}
