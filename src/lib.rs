//! Click and hover wiring for the squares of a board-game front end.
//!
//! [`EventBinder`] finds every square in a [`zdom::Document`], records the
//! last clicked square and signals an external update control, and keeps a
//! single highlight rule in a style element for the hovered square.

pub mod binder;
pub mod board;
pub mod config;
pub mod error;
pub mod square;
pub mod state;


pub use crate::{
    binder::EventBinder,
    board::Board,
    config::{Config, MalformedIdPolicy, RebindStrategy},
    error::SqError,
    square::SquarePos,
    state::{InteractionState, SharedState},
};

pub type SqResult<T = ()> = Result<T, SqError>;
