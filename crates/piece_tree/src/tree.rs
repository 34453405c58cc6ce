use slotmap::{SlotMap, new_key_type};

use crate::piece::Piece;

new_key_type! {
    pub(crate) struct NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeColor {
    Red,
    Black,
}

#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    pub(crate) piece: Piece,
    pub(crate) color: NodeColor,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// Bytes in this subtree.
    pub(crate) size: usize,
    /// Line breaks in this subtree.
    pub(crate) lf: usize,
}

impl TreeNode {
    fn new(piece: Piece, color: NodeColor) -> Self {
        let size = piece.len();
        let lf = piece.line_break_count();
        Self {
            piece,
            color,
            parent: None,
            left: None,
            right: None,
            size,
            lf,
        }
    }
}

/// A red-black tree of pieces ordered by document position.
///
/// Nodes live in an arena and point at each other by key. Every node
/// caches the byte length and line-break count of its subtree, so offset
/// and line lookups descend in O(log n) without touching piece text.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tree {
    nodes: SlotMap<NodeId, TreeNode>,
    root: Option<NodeId>,
}

impl Tree {
    /// Bottom-up construction from pieces already in document order.
    ///
    /// Subtree sizes differ by at most one at every node, so every nil
    /// sits at depth `h` or `h + 1` with `h = floor(log2(n + 1))`.
    /// Colouring the nodes at depth `h` red balances black heights.
    pub(crate) fn from_pieces(pieces: Vec<Piece>) -> Self {
        let mut tree = Tree::default();
        let count = pieces.len();
        if count == 0 {
            return tree;
        }
        let red_depth = (usize::BITS - 1 - (count + 1).leading_zeros()) as usize;
        let mut pieces = pieces.into_iter();
        tree.root = tree.build_balanced(&mut pieces, count, 0, red_depth);
        tree
    }

    fn build_balanced<I: Iterator<Item = Piece>>(
        &mut self,
        pieces: &mut I,
        count: usize,
        depth: usize,
        red_depth: usize,
    ) -> Option<NodeId> {
        if count == 0 {
            return None;
        }
        let left_count = count / 2;
        let left = self.build_balanced(pieces, left_count, depth + 1, red_depth);
        let piece = pieces.next()?;
        let color = if depth == red_depth {
            NodeColor::Red
        } else {
            NodeColor::Black
        };
        let id = self.nodes.insert(TreeNode::new(piece, color));
        let right = self.build_balanced(pieces, count - left_count - 1, depth + 1, red_depth);

        self.nodes[id].left = left;
        self.nodes[id].right = right;
        for child in [left, right].into_iter().flatten() {
            self.nodes[child].parent = Some(id);
        }
        self.update(id);
        Some(id)
    }

    #[inline]
    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    #[inline]
    pub(crate) fn piece(&self, id: NodeId) -> &Piece {
        &self.nodes[id].piece
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.size_of(self.root)
    }

    pub(crate) fn line_break_count(&self) -> usize {
        self.lf_of(self.root)
    }

    #[inline]
    fn size_of(&self, node: Option<NodeId>) -> usize {
        node.map_or(0, |id| self.nodes[id].size)
    }

    #[inline]
    fn lf_of(&self, node: Option<NodeId>) -> usize {
        node.map_or(0, |id| self.nodes[id].lf)
    }

    #[inline]
    fn color_of(&self, node: Option<NodeId>) -> NodeColor {
        node.map_or(NodeColor::Black, |id| self.nodes[id].color)
    }

    #[inline]
    fn set_color(&mut self, id: NodeId, color: NodeColor) {
        self.nodes[id].color = color;
    }

    /// Recompute the cached aggregates of `id` from its children.
    fn update(&mut self, id: NodeId) {
        let (left, right) = (self.nodes[id].left, self.nodes[id].right);
        let size = self.size_of(left) + self.nodes[id].piece.len() + self.size_of(right);
        let lf = self.lf_of(left) + self.nodes[id].piece.line_break_count() + self.lf_of(right);
        let node = &mut self.nodes[id];
        node.size = size;
        node.lf = lf;
    }

    fn update_upwards(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(n) = cur {
            self.update(n);
            cur = self.nodes[n].parent;
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.nodes[id].right {
            id = right;
        }
        id
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.leftmost(root))
    }

    #[cfg(test)]
    pub(crate) fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order successor.
    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(right) = self.nodes[id].right {
            return Some(self.leftmost(right));
        }
        let mut cur = id;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[parent].left == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    /// In-order predecessor.
    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        if let Some(left) = self.nodes[id].left {
            return Some(self.rightmost(left));
        }
        let mut cur = id;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[parent].right == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    /// The node whose piece covers `offset`, with the document offset at
    /// which that piece starts. `None` when `offset >= len()`.
    pub(crate) fn locate_by_offset(&self, offset: usize) -> Option<(NodeId, usize)> {
        let mut cur = self.root;
        let mut rel = offset;
        let mut node_start = 0;

        while let Some(id) = cur {
            let node = &self.nodes[id];
            let left_size = self.size_of(node.left);
            let piece_len = node.piece.len();

            if rel < left_size {
                cur = node.left;
            } else if rel < left_size + piece_len {
                return Some((id, node_start + left_size));
            } else {
                rel -= left_size + piece_len;
                node_start += left_size + piece_len;
                cur = node.right;
            }
        }

        None
    }

    /// The node holding the `ordinal`-th line break (1-based), the document
    /// offset where its piece starts, and the index of that break among the
    /// piece's own line starts.
    pub(crate) fn locate_by_line(&self, ordinal: usize) -> Option<(NodeId, usize, usize)> {
        if ordinal == 0 {
            return None;
        }
        let mut cur = self.root;
        let mut rem = ordinal;
        let mut node_start = 0;

        while let Some(id) = cur {
            let node = &self.nodes[id];
            let left_lf = self.lf_of(node.left);
            let piece_lf = node.piece.line_break_count();

            if rem <= left_lf {
                cur = node.left;
            } else if rem <= left_lf + piece_lf {
                let left_size = self.size_of(node.left);
                return Some((id, node_start + left_size, rem - left_lf - 1));
            } else {
                rem -= left_lf + piece_lf;
                node_start += self.size_of(node.left) + node.piece.len();
                cur = node.right;
            }
        }

        None
    }

    /// Number of line breaks ending at or before `offset`.
    pub(crate) fn breaks_before(&self, offset: usize) -> usize {
        let mut cur = self.root;
        let mut rel = offset;
        let mut acc = 0;

        while let Some(id) = cur {
            let node = &self.nodes[id];
            let left_size = self.size_of(node.left);

            if rel < left_size {
                cur = node.left;
                continue;
            }
            acc += self.lf_of(node.left);
            rel -= left_size;

            let piece_len = node.piece.len();
            if rel < piece_len {
                return acc + node.piece.breaks_before(rel);
            }
            acc += node.piece.line_break_count();
            rel -= piece_len;
            cur = node.right;
        }

        acc
    }

    /// Replace the piece held by `id`, refreshing aggregates up to the root.
    pub(crate) fn set_piece(&mut self, id: NodeId, piece: Piece) {
        self.nodes[id].piece = piece;
        self.update_upwards(id);
    }

    /// Insert `piece` right after `after` in document order, or at the very
    /// front when `after` is `None`.
    pub(crate) fn insert_after(&mut self, after: Option<NodeId>, piece: Piece) -> NodeId {
        let z = self.nodes.insert(TreeNode::new(piece, NodeColor::Red));

        match (self.root, after) {
            (None, _) => {
                self.root = Some(z);
            }
            (Some(root), None) => {
                let first = self.leftmost(root);
                self.nodes[first].left = Some(z);
                self.nodes[z].parent = Some(first);
            }
            (Some(_), Some(node)) => match self.nodes[node].right {
                None => {
                    self.nodes[node].right = Some(z);
                    self.nodes[z].parent = Some(node);
                }
                Some(right) => {
                    let next = self.leftmost(right);
                    self.nodes[next].left = Some(z);
                    self.nodes[z].parent = Some(next);
                }
            },
        }

        if let Some(parent) = self.nodes[z].parent {
            self.update_upwards(parent);
        }
        self.fix_insert(z);
        z
    }

    /// Unlink `z` from the tree.
    ///
    /// When `z` has two children its in-order successor's piece moves into
    /// `z` and the successor's node is the one freed, so keys other than
    /// `z` may be invalidated. Callers re-locate by offset afterwards.
    pub(crate) fn remove(&mut self, z: NodeId) {
        let y = match (self.nodes[z].left, self.nodes[z].right) {
            (Some(_), Some(right)) => self.leftmost(right),
            _ => z,
        };
        let x = self.nodes[y].left.or(self.nodes[y].right);
        let x_parent = self.nodes[y].parent;

        if let Some(x) = x {
            self.nodes[x].parent = x_parent;
        }
        self.replace_child(x_parent, y, x);

        let Some(removed) = self.nodes.remove(y) else {
            return;
        };
        if y != z {
            self.nodes[z].piece = removed.piece;
        }
        // z is an ancestor of y, so this walk refreshes it too
        if let Some(parent) = x_parent {
            self.update_upwards(parent);
        }
        if removed.color == NodeColor::Black {
            self.fix_remove(x, x_parent);
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let Some(y) = self.nodes[x].right else {
            return;
        };

        let y_left = self.nodes[y].left;
        self.nodes[x].right = y_left;
        if let Some(yl) = y_left {
            self.nodes[yl].parent = Some(x);
        }

        let x_parent = self.nodes[x].parent;
        self.nodes[y].parent = x_parent;
        self.replace_child(x_parent, x, Some(y));

        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);

        // y now covers exactly what x covered, so ancestors stay valid
        self.update(x);
        self.update(y);
    }

    fn rotate_right(&mut self, y: NodeId) {
        let Some(x) = self.nodes[y].left else {
            return;
        };

        let x_right = self.nodes[x].right;
        self.nodes[y].left = x_right;
        if let Some(xr) = x_right {
            self.nodes[xr].parent = Some(y);
        }

        let y_parent = self.nodes[y].parent;
        self.nodes[x].parent = y_parent;
        self.replace_child(y_parent, y, Some(x));

        self.nodes[x].right = Some(y);
        self.nodes[y].parent = Some(x);

        self.update(y);
        self.update(x);
    }

    // ---------- Insert fix-up (RB insert balancing) ----------
    fn fix_insert(&mut self, mut z: NodeId) {
        while let Some(parent) = self.nodes[z].parent {
            if self.nodes[parent].color != NodeColor::Red {
                break;
            }
            // a red parent is never the root, but stay total anyway
            let Some(grand) = self.nodes[parent].parent else {
                break;
            };

            if self.nodes[grand].left == Some(parent) {
                let uncle = self.nodes[grand].right;
                if self.color_of(uncle) == NodeColor::Red {
                    // Case 1
                    self.set_color(parent, NodeColor::Black);
                    if let Some(u) = uncle {
                        self.set_color(u, NodeColor::Black);
                    }
                    self.set_color(grand, NodeColor::Red);
                    z = grand;
                } else {
                    // Case 2/3
                    if self.nodes[parent].right == Some(z) {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let Some(parent) = self.nodes[z].parent else {
                        break;
                    };
                    self.set_color(parent, NodeColor::Black);
                    self.set_color(grand, NodeColor::Red);
                    self.rotate_right(grand);
                }
            } else {
                // Mirror cases
                let uncle = self.nodes[grand].left;
                if self.color_of(uncle) == NodeColor::Red {
                    self.set_color(parent, NodeColor::Black);
                    if let Some(u) = uncle {
                        self.set_color(u, NodeColor::Black);
                    }
                    self.set_color(grand, NodeColor::Red);
                    z = grand;
                } else {
                    if self.nodes[parent].left == Some(z) {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let Some(parent) = self.nodes[z].parent else {
                        break;
                    };
                    self.set_color(parent, NodeColor::Black);
                    self.set_color(grand, NodeColor::Red);
                    self.rotate_left(grand);
                }
            }
        }

        if let Some(root) = self.root {
            self.set_color(root, NodeColor::Black);
        }
    }

    // ---------- Remove fix-up (RB delete balancing) ----------
    fn fix_remove(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while x != self.root && self.color_of(x) == NodeColor::Black {
            let Some(p) = parent else {
                break;
            };

            if self.nodes[p].left == x {
                let Some(mut w) = self.nodes[p].right else {
                    break;
                };
                if self.nodes[w].color == NodeColor::Red {
                    self.set_color(w, NodeColor::Black);
                    self.set_color(p, NodeColor::Red);
                    self.rotate_left(p);
                    match self.nodes[p].right {
                        Some(sibling) => w = sibling,
                        None => break,
                    }
                }

                let (wl, wr) = (self.nodes[w].left, self.nodes[w].right);
                if self.color_of(wl) == NodeColor::Black && self.color_of(wr) == NodeColor::Black {
                    self.set_color(w, NodeColor::Red);
                    x = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if self.color_of(wr) == NodeColor::Black {
                        if let Some(wl) = wl {
                            self.set_color(wl, NodeColor::Black);
                        }
                        self.set_color(w, NodeColor::Red);
                        self.rotate_right(w);
                        match self.nodes[p].right {
                            Some(sibling) => w = sibling,
                            None => break,
                        }
                    }
                    let p_color = self.nodes[p].color;
                    self.set_color(w, p_color);
                    self.set_color(p, NodeColor::Black);
                    if let Some(wr) = self.nodes[w].right {
                        self.set_color(wr, NodeColor::Black);
                    }
                    self.rotate_left(p);
                    x = self.root;
                    parent = None;
                }
            } else {
                let Some(mut w) = self.nodes[p].left else {
                    break;
                };
                if self.nodes[w].color == NodeColor::Red {
                    self.set_color(w, NodeColor::Black);
                    self.set_color(p, NodeColor::Red);
                    self.rotate_right(p);
                    match self.nodes[p].left {
                        Some(sibling) => w = sibling,
                        None => break,
                    }
                }

                let (wl, wr) = (self.nodes[w].left, self.nodes[w].right);
                if self.color_of(wl) == NodeColor::Black && self.color_of(wr) == NodeColor::Black {
                    self.set_color(w, NodeColor::Red);
                    x = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if self.color_of(wl) == NodeColor::Black {
                        if let Some(wr) = wr {
                            self.set_color(wr, NodeColor::Black);
                        }
                        self.set_color(w, NodeColor::Red);
                        self.rotate_left(w);
                        match self.nodes[p].left {
                            Some(sibling) => w = sibling,
                            None => break,
                        }
                    }
                    let p_color = self.nodes[p].color;
                    self.set_color(w, p_color);
                    self.set_color(p, NodeColor::Black);
                    if let Some(wl) = self.nodes[w].left {
                        self.set_color(wl, NodeColor::Black);
                    }
                    self.rotate_right(p);
                    x = self.root;
                    parent = None;
                }
            }
        }

        if let Some(x) = x {
            self.set_color(x, NodeColor::Black);
        }
    }

    /// Node keys in document order.
    pub(crate) fn iter(&self) -> TreeIter<'_> {
        TreeIter {
            tree: self,
            next: self.first(),
        }
    }

    #[cfg(test)]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id]
    }
}

pub(crate) struct TreeIter<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for TreeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.next(id);
        Some(id)
    }
}
