use ast::{ChangeType, Node};

/**
 * Whether a value, binding or condition differs between the two versions of
 * the analyzed file.
 *
 * <pre>
 *          TOP
 *        /     \
 *  UNCHANGED  CHANGED
 *        \     /
 *         BOTTOM
 * </pre>
 */
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Change {
    Bottom,
    Unchanged,
    Changed,
    Top,
}

impl Default for Change {
    fn default() -> Self {
        Change::Bottom
    }
}

impl Change {
    pub fn join(self, other: Change) -> Change {
        match (self, other) {
            (Change::Bottom, x) | (x, Change::Bottom) => x,
            (Change::Top, _) | (_, Change::Top) => Change::Top,
            (a, b) if a == b => a,
            _ => Change::Top,
        }
    }

    /// Whether `self` is below or equal to `other`.
    pub fn le(self, other: Change) -> bool {
        self.join(other) == other
    }

    /// Changed or possibly changed.
    pub fn is_changed(self) -> bool {
        matches!(self, Change::Changed | Change::Top)
    }

    /// Inserted and removed nodes are changed.
    pub fn conv<N: Node + ?Sized>(node: &N) -> Change {
        match node.change_type() {
            ChangeType::Inserted | ChangeType::Removed => Change::Changed,
            _ => Change::Unchanged,
        }
    }

    /// Like [Change::conv], but also treats updated nodes as changed.
    pub fn conv_u<N: Node + ?Sized>(node: &N) -> Change {
        match node.change_type() {
            ChangeType::Inserted | ChangeType::Removed | ChangeType::Updated => Change::Changed,
            _ => Change::Unchanged,
        }
    }
}
