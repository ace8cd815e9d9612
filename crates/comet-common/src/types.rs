//! Identifier newtypes shared across the workspace

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform account id of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

/// Platform id of a group conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<u64> for ScopeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Conversation a message belongs to. Sessions are keyed by this value.
///
/// Group chats share one scope per group; a private chat is scoped to the
/// other participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A group conversation
    Group(ScopeId),
    /// A one-to-one conversation with the given actor
    Private(ActorId),
}

impl Scope {
    /// The group id, if this is a group scope
    pub fn group(&self) -> Option<ScopeId> {
        match self {
            Self::Group(id) => Some(*id),
            Self::Private(_) => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Private(id) => write!(f, "private:{id}"),
        }
    }
}
