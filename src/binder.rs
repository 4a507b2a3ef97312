use std::{cell::RefCell, rc::Rc};

use log::{debug, info, trace};
use zdom::{Document, ElementId, Event, EventKind, HandlerResult, Listener, ListenerHandle};

use crate::{
    config::{Config, RebindStrategy},
    error::SqError,
    square::highlight_rule,
    state::{InteractionState, SharedState},
    SqResult,
};

/// Attaches click and hover handlers to every square of a document.
///
/// The binder owns the selection state and remembers which listeners it
/// attached, so `bind_all` can be called again after the board is re-rendered
/// without stacking duplicate handlers.
#[derive(Debug)]
pub struct EventBinder {
    config: Config,
    state: SharedState,
    style_slot: ElementId,
    update_control: ElementId,
    handles: Vec<ListenerHandle>,
}

impl EventBinder {
    /// Fails if the style slot or the update control isn't in the document.
    pub fn new(doc: &Document, config: Config) -> SqResult<Self> {
        let style_slot = find_element(doc, &config.style_slot_id)?;
        let update_control = find_element(doc, &config.update_control_id)?;
        debug!(
            "EventBinder: style_slot={:?} update_control={:?}",
            style_slot, update_control
        );
        Ok(Self {
            config,
            state: Rc::new(RefCell::new(InteractionState::new())),
            style_slot,
            update_control,
            handles: Vec::new(),
        })
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Binds every square currently in the document.
    /// Returns the number of squares bound.
    ///
    /// The style slot and update control are looked up again first, since the
    /// page may have been re-rendered. If either is gone, the call fails
    /// before any square is touched.
    pub fn bind_all(&mut self, doc: &mut Document) -> SqResult<usize> {
        let style_slot = find_element(doc, &self.config.style_slot_id)?;
        let update_control = find_element(doc, &self.config.update_control_id)?;
        match self.config.rebind {
            RebindStrategy::Deregister => self.unbind_all(doc),
            RebindStrategy::CloneReplace => {
                self.handles.clear();
                for square in doc.get_elements_by_class_name(&self.config.square_class) {
                    // Nested squares were already replaced along with their parent.
                    if doc.is_attached(square) {
                        replace_with_clone(doc, square)?;
                    }
                }
            }
        }
        self.style_slot = style_slot;
        self.update_control = update_control;
        let on_click = self.click_listener();
        let on_hover = self.hover_listener();
        let squares = doc.get_elements_by_class_name(&self.config.square_class);
        for &square in &squares {
            let click = doc.add_event_listener(square, EventKind::Click, on_click.clone())?;
            let hover = doc.add_event_listener(square, EventKind::MouseOver, on_hover.clone())?;
            self.handles.push(click);
            self.handles.push(hover);
        }
        info!(
            "EventBinder: bound {} squares ({:?})",
            squares.len(),
            self.config.rebind
        );
        Ok(squares.len())
    }

    /// Removes every listener this binder attached. Listeners on elements
    /// that have left the document are dropped silently.
    pub fn unbind_all(&mut self, doc: &mut Document) {
        let mut removed = 0;
        for handle in self.handles.drain(..) {
            if doc.remove_event_listener(handle) {
                removed += 1;
            }
        }
        trace!("EventBinder: removed {} listeners", removed);
    }

    fn click_listener(&self) -> Listener {
        let state = self.state.clone();
        let update_control = self.update_control;
        Rc::new(move |doc: &mut Document, event: &Event| -> HandlerResult {
            let id = doc.id(event.current_target).unwrap_or("").to_string();
            debug!("click: {}", id);
            {
                let mut state = state.borrow_mut();
                state.set_click_pos(&id);
                state.count_update();
            }
            doc.click(update_control)?;
            Ok(())
        })
    }

    fn hover_listener(&self) -> Listener {
        let style_slot = self.style_slot;
        let color = self.config.highlight_color;
        let policy = self.config.malformed_ids;
        Rc::new(move |doc: &mut Document, event: &Event| -> HandlerResult {
            let id = doc.id(event.current_target).unwrap_or("");
            let rule = highlight_rule(id, color, policy)?;
            trace!("hover: {}", rule);
            doc.set_text(style_slot, &rule)?;
            Ok(())
        })
    }
}

fn find_element(doc: &Document, id: &str) -> SqResult<ElementId> {
    doc.get_element_by_id(id)
        .ok_or_else(|| SqError::MissingElement { id: id.to_string() })
}

fn replace_with_clone(doc: &mut Document, el: ElementId) -> SqResult<ElementId> {
    let copy = doc.clone_node(el)?;
    if let Some(parent) = doc.parent(el) {
        doc.replace_child(parent, copy, el)?;
    }
    Ok(copy)
}
