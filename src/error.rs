//! Errors raised while building, querying, or dispatching over menus.
//!
//! Nothing here is retried or swallowed: a failing target aborts the whole
//! handler fan-out and the error reaches the caller unchanged.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MenuError {
    /// A handler-level `find` asked for lists that exist nowhere in scope.
    #[error("Some item lists you are trying to find do not exist ({})", .names.join(", "))]
    NotFound { names: Vec<String> },
    /// Direct registry lookup of a name that was never registered.
    #[error("No item list is registered under {0:?}")]
    UnregisteredName(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid active pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// Nesting would make a list reachable from its own descendants.
    #[error("Item list {0} cannot be nested inside its own subtree")]
    Cycle(usize),
    /// The list is already the children of another item.
    #[error("Item list {0} already belongs to another item")]
    ListInUse(usize),
    /// A list or item handle minted before the tree was cleared, or by another tree.
    #[error("Stale menu handle: {0}")]
    StaleHandle(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
