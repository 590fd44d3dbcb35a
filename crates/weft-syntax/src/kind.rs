//! Node kinds and the name table that gives them meaning.
//!
//! The core never interprets kinds beyond the four reserved ones below; every
//! other kind is allocated by a grammar through [`NodeSet::define`].

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Identifier of a node or token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeKind(pub u16);

impl NodeKind {
    /// Structural node without a type of its own (balancing groups, chunk
    /// wrappers). Navigation looks straight through it.
    pub const ANONYMOUS: NodeKind = NodeKind(0);

    /// Root of a compiled document.
    pub const DOCUMENT: NodeKind = NodeKind(1);

    /// Leaf covering input the grammar could not match.
    pub const UNRECOGNIZED: NodeKind = NodeKind(2);

    /// Zero-width leaf injected into a node that was never closed.
    pub const INCOMPLETE: NodeKind = NodeKind(3);

    /// First identifier available to grammars.
    pub const FIRST_GRAMMAR: u16 = 4;

    /// Returns `true` for the anonymous kind.
    #[must_use]
    pub fn is_anonymous(self) -> bool {
        self == Self::ANONYMOUS
    }

    /// Returns `true` for the two reserved error kinds.
    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(self, Self::UNRECOGNIZED | Self::INCOMPLETE)
    }

    pub(crate) fn from_raw(raw: i32) -> Self {
        // Records only ever hold values that came from a `NodeKind`.
        Self(u16::try_from(raw).unwrap_or_default())
    }

    pub(crate) fn raw(self) -> i32 {
        i32::from(self.0)
    }
}

impl From<u16> for NodeKind {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Names of every kind a grammar uses.
#[derive(Debug, Clone)]
pub struct NodeSet {
    names: Vec<SmolStr>,
    by_name: FxHashMap<SmolStr, NodeKind>,
}

impl NodeSet {
    /// Creates a set holding only the reserved kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut set = Self {
            names: Vec::new(),
            by_name: FxHashMap::default(),
        };
        for name in ["", "Document", "Unrecognized", "Incomplete"] {
            set.push(SmolStr::new(name));
        }
        set
    }

    /// Allocates a new kind, or returns the existing one with the same name.
    pub fn define(&mut self, name: &str) -> NodeKind {
        if let Some(kind) = self.by_name.get(name) {
            return *kind;
        }
        self.push(SmolStr::new(name))
    }

    fn push(&mut self, name: SmolStr) -> NodeKind {
        let kind = NodeKind(u16::try_from(self.names.len()).unwrap_or(u16::MAX));
        if !name.is_empty() {
            self.by_name.insert(name.clone(), kind);
        }
        self.names.push(name);
        kind
    }

    /// Returns the name of `kind`, `"?"` for kinds this set never defined.
    #[must_use]
    pub fn name(&self, kind: NodeKind) -> &str {
        self.names.get(usize::from(kind.0)).map_or("?", SmolStr::as_str)
    }

    /// Looks a kind up by name.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<NodeKind> {
        self.by_name.get(name).copied()
    }

    /// Number of kinds, reserved ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`: the reserved kinds are present from the start.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NodeSet {
    fn default() -> Self {
        Self::new()
    }
}
