//! Tokens produced by a grammar matcher.

use crate::kind::NodeKind;

/// A matched token, in absolute document offsets.
///
/// `open` lists the kinds that start at this token, `close` the kinds that end
/// with it (innermost first). Empty lists are normalized to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarToken {
    /// The token's own kind. `ANONYMOUS` tokens only carry scope events.
    pub kind: NodeKind,
    /// Start offset.
    pub from: u32,
    /// End offset.
    pub to: u32,
    /// Kinds opened at this token.
    pub open: Option<Vec<NodeKind>>,
    /// Kinds closed by this token.
    pub close: Option<Vec<NodeKind>>,
}

impl GrammarToken {
    /// Creates a token with no scope events.
    #[must_use]
    pub fn new(kind: NodeKind, from: u32, to: u32) -> Self {
        Self {
            kind,
            from,
            to,
            open: None,
            close: None,
        }
    }

    /// Synthetic token for input the grammar could not match.
    #[must_use]
    pub fn unrecognized(from: u32, to: u32) -> Self {
        Self::new(NodeKind::UNRECOGNIZED, from, to)
    }

    /// Adds kinds opened by this token.
    #[must_use]
    pub fn opening(mut self, kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        self.open = extend(self.open, kinds);
        self
    }

    /// Adds kinds closed by this token.
    #[must_use]
    pub fn closing(mut self, kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        self.close = extend(self.close, kinds);
        self
    }

    /// Returns the length of the token in bytes.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.to.saturating_sub(self.from)
    }

    /// Returns true if the token has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

fn extend(
    list: Option<Vec<NodeKind>>,
    kinds: impl IntoIterator<Item = NodeKind>,
) -> Option<Vec<NodeKind>> {
    let mut list = list.unwrap_or_default();
    list.extend(kinds);
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}
