// THEORY:
// The `EquivalenceTable` is the per-frame scratch memory of the labeler. While
// scanning, a single region can be reached from several directions and end up
// with several provisional labels. The table records that "label 9 is really
// label 4" without touching the pixels already written.
//
// Key invariants:
// 1.  **Downward Only**: `table[x] <= x` for every label. A label is either its
//     own root (`table[x] == x`) or points at a strictly lower label. Chains
//     therefore always terminate, and one descending compression pass is
//     enough to point every label straight at its root.
// 2.  **Arena Reuse**: The table is sized once for the labeler's capacity and
//     reused across frames. `reset` only rewinds the slots the previous frame
//     actually used.
// 3.  **Slot 0 Is Background**: label 0 is never allocated and never merged.

pub type Label = u32;

/// Provisional-label to canonical-label mapping, reused across frames.
#[derive(Debug, Clone)]
pub struct EquivalenceTable {
    parent: Vec<Label>,
    /// Highest label handed out since the last reset.
    used: Label,
}

impl EquivalenceTable {
    /// Creates a table able to hold labels `1..=capacity`.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            parent: (0..=capacity).collect(),
            used: 0,
        }
    }

    /// The maximum number of labels a single frame may allocate.
    pub fn capacity(&self) -> u32 {
        (self.parent.len() - 1) as u32
    }

    /// Number of labels allocated since the last reset.
    pub fn used(&self) -> u32 {
        self.used
    }

    /// Rewinds every slot touched by the previous frame to the identity mapping.
    pub fn reset(&mut self) {
        for label in 1..=self.used as usize {
            self.parent[label] = label as Label;
        }
        self.used = 0;
    }

    /// Allocates the next fresh label, or `None` once capacity is exhausted.
    pub fn allocate(&mut self) -> Option<Label> {
        if self.used >= self.capacity() {
            return None;
        }
        self.used += 1;
        Some(self.used)
    }

    /// Follows the chain of `label` down to its root.
    pub fn root(&self, mut label: Label) -> Label {
        while self.parent[label as usize] != label {
            label = self.parent[label as usize];
        }
        label
    }

    /// Records that `a` and `b` belong to the same region.
    ///
    /// Both labels are pointed at the lower of their two roots, and the higher
    /// root is re-pointed too, so a later lookup through either old chain lands
    /// on the same root. Mappings only ever move downward.
    pub fn union(&mut self, a: Label, b: Label) {
        if a == 0 || b == 0 || a == b {
            return;
        }
        let root_a = self.root(a);
        let root_b = self.root(b);
        let low = root_a.min(root_b);
        let high = root_a.max(root_b);
        self.parent[high as usize] = low;
        if a > low {
            self.parent[a as usize] = low;
        }
        if b > low {
            self.parent[b as usize] = low;
        }
    }

    /// Points every used label directly at its root.
    ///
    /// Walks from the highest label down. Each chain only visits lower labels,
    /// so after this pass every lookup is a single indirection.
    pub fn compress(&mut self) {
        for label in (1..=self.used).rev() {
            let root = self.root(label);
            self.parent[label as usize] = root;
        }
    }

    /// Renumbers roots to a dense `1..=n` range in ascending order of their
    /// original value, and points every used label at its dense root.
    /// Must be called after `compress`. Returns `n`.
    pub fn make_contiguous(&mut self) -> u32 {
        let mut next = 0;
        for label in 1..=self.used as usize {
            let parent = self.parent[label] as usize;
            if parent == label {
                next += 1;
                self.parent[label] = next;
            } else {
                // `parent < label`, so it was already renumbered above.
                self.parent[label] = self.parent[parent];
            }
        }
        next
    }

    /// Resolved label for `label`. Only meaningful after `compress`.
    #[inline]
    pub fn resolve(&self, label: Label) -> Label {
        self.parent[label as usize]
    }
}
