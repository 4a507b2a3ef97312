use std::{cell::RefCell, rc::Rc};

use crate::square::SquarePos;

/// Selection slot shared between the binder and its click handlers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionState {
    click_pos: Option<String>,
    updates: usize,
}

pub type SharedState = Rc<RefCell<InteractionState>>;

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw id of the most recently clicked square.
    pub fn click_pos(&self) -> Option<&str> {
        self.click_pos.as_deref()
    }

    /// The last click as a position, if its id was well-formed.
    pub fn selected(&self) -> Option<SquarePos> {
        self.click_pos.as_ref().and_then(|id| id.parse().ok())
    }

    /// Number of update signals sent so far.
    pub fn updates(&self) -> usize {
        self.updates
    }

    pub(crate) fn set_click_pos(&mut self, id: &str) {
        self.click_pos = Some(id.to_string());
    }

    pub(crate) fn count_update(&mut self) {
        self.updates += 1;
    }
}
