//! Ten-cell board model
//!
//! Cells are laid out in three staggered rows of 3, 4 and 3:
//!
//! ```text
//!    0   1   2
//!  3   4   5   6
//!    7   8   9
//! ```
//!
//! The short rows sit half a cell inward, so a cell in a short row touches two
//! cells of the long row and vice versa.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Index of a board cell (0..10)
pub type CellId = u8;

/// Number of cells on the board
pub const CELL_COUNT: usize = 10;

/// Row lengths, top to bottom
pub const ROW_LENGTHS: [usize; 3] = [3, 4, 3];

/// Index of the first cell in each row
const ROW_STARTS: [usize; 3] = [0, 3, 7];

/// Compact set of cells backed by a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellSet(u16);

impl CellSet {
    const FULL: u16 = (1 << CELL_COUNT) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every cell on the board
    pub const fn all() -> Self {
        Self(Self::FULL)
    }

    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        (cell as usize) < CELL_COUNT && self.0 & (1 << cell) != 0
    }

    /// Insert a cell, returning true if it was not already present
    #[inline]
    pub fn insert(&mut self, cell: CellId) -> bool {
        if (cell as usize) >= CELL_COUNT {
            return false;
        }
        let fresh = !self.contains(cell);
        self.0 |= 1 << cell;
        fresh
    }

    /// Remove a cell, returning true if it was present
    #[inline]
    pub fn remove(&mut self, cell: CellId) -> bool {
        let present = self.contains(cell);
        if present {
            self.0 &= !(1 << cell);
        }
        present
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn union(&self, other: &CellSet) -> CellSet {
        CellSet(self.0 | other.0)
    }

    pub fn intersection(&self, other: &CellSet) -> CellSet {
        CellSet(self.0 & other.0)
    }

    /// Cells not in this set
    pub fn complement(&self) -> CellSet {
        CellSet(!self.0 & Self::FULL)
    }

    /// Cells in ascending order
    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..CELL_COUNT as CellId).filter(move |&c| self.contains(c))
    }

    pub fn to_vec(&self) -> Vec<CellId> {
        self.iter().collect()
    }
}

impl FromIterator<CellId> for CellSet {
    fn from_iter<I: IntoIterator<Item = CellId>>(iter: I) -> Self {
        let mut set = CellSet::empty();
        for cell in iter {
            set.insert(cell);
        }
        set
    }
}

/// Lit/pressed state of the board
///
/// `active` and `pressed` never overlap: pressing a cell moves it out of
/// `active`, and activating a pressed cell is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    active: CellSet,
    pressed: CellSet,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> CellSet {
        self.active
    }

    pub fn pressed(&self) -> CellSet {
        self.pressed
    }

    pub fn is_active(&self, cell: CellId) -> bool {
        self.active.contains(cell)
    }

    pub fn is_pressed(&self, cell: CellId) -> bool {
        self.pressed.contains(cell)
    }

    /// Cells that are neither lit nor pressed
    pub fn free(&self) -> CellSet {
        self.active.union(&self.pressed).complement()
    }

    /// Light a cell. Pressed cells cannot be re-lit until cleared.
    pub fn activate(&mut self, cell: CellId) -> bool {
        if self.pressed.contains(cell) {
            return false;
        }
        self.active.insert(cell)
    }

    pub fn deactivate(&mut self, cell: CellId) -> bool {
        self.active.remove(cell)
    }

    /// Move a lit cell into the pressed set
    pub fn press(&mut self, cell: CellId) -> bool {
        if !self.active.remove(cell) {
            return false;
        }
        self.pressed.insert(cell);
        true
    }

    /// Mark a cell pressed regardless of whether it was lit
    pub fn mark_pressed(&mut self, cell: CellId) {
        self.active.remove(cell);
        self.pressed.insert(cell);
    }

    /// Replace the lit set, dropping any cell that is pressed
    pub fn set_active(&mut self, cells: CellSet) {
        self.active = cells.intersection(&self.pressed.complement());
    }

    pub fn clear_active(&mut self) {
        self.active.clear();
    }

    pub fn clear_pressed(&mut self) {
        self.pressed.clear();
    }

    /// Clear everything (between rounds)
    pub fn reset(&mut self) {
        self.active.clear();
        self.pressed.clear();
    }

    /// True while the lit and pressed sets are disjoint
    pub fn is_consistent(&self) -> bool {
        self.active.intersection(&self.pressed).is_empty()
    }
}

/// Row and column of a cell
pub fn position(cell: CellId) -> Option<(usize, usize)> {
    let cell = cell as usize;
    if cell >= CELL_COUNT {
        return None;
    }
    let row = ROW_STARTS.iter().rposition(|&start| cell >= start)?;
    Some((row, cell - ROW_STARTS[row]))
}

/// Cell at a row and column, if it exists
pub fn cell_at(row: usize, col: usize) -> Option<CellId> {
    if row >= ROW_LENGTHS.len() || col >= ROW_LENGTHS[row] {
        return None;
    }
    Some((ROW_STARTS[row] + col) as CellId)
}

/// Cells touching `cell`: left/right in its row, plus the offset-adjusted
/// cells in the rows above and below.
pub fn neighbors(cell: CellId) -> Vec<CellId> {
    let Some((row, col)) = position(cell) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(6);
    if col > 0 {
        out.extend(cell_at(row, col - 1));
    }
    out.extend(cell_at(row, col + 1));

    for other in [row.wrapping_sub(1), row + 1] {
        if other >= ROW_LENGTHS.len() {
            continue;
        }
        if ROW_LENGTHS[other] > ROW_LENGTHS[row] {
            // Short row into long row: the two cells straddling this one
            out.extend(cell_at(other, col));
            out.extend(cell_at(other, col + 1));
        } else {
            // Long row into short row
            if col > 0 {
                out.extend(cell_at(other, col - 1));
            }
            out.extend(cell_at(other, col));
        }
    }
    out
}

/// Breadth-first ordering of all cells from `origin`, closest first.
///
/// Returns `(cell, hop distance)`; ties keep ascending cell order.
pub fn wave_order(origin: CellId) -> Vec<(CellId, u32)> {
    if (origin as usize) >= CELL_COUNT {
        return Vec::new();
    }

    let mut dist = [u32::MAX; CELL_COUNT];
    let mut queue = VecDeque::new();
    dist[origin as usize] = 0;
    queue.push_back(origin);

    while let Some(cell) = queue.pop_front() {
        let mut next = neighbors(cell);
        next.sort_unstable();
        for n in next {
            if dist[n as usize] == u32::MAX {
                dist[n as usize] = dist[cell as usize] + 1;
                queue.push_back(n);
            }
        }
    }

    let mut order: Vec<(CellId, u32)> = (0..CELL_COUNT as CellId)
        .filter(|&c| dist[c as usize] != u32::MAX)
        .map(|c| (c, dist[c as usize]))
        .collect();
    order.sort_by_key(|&(cell, d)| (d, cell));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted(mut v: Vec<CellId>) -> Vec<CellId> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_positions() {
        assert_eq!(position(0), Some((0, 0)));
        assert_eq!(position(2), Some((0, 2)));
        assert_eq!(position(3), Some((1, 0)));
        assert_eq!(position(6), Some((1, 3)));
        assert_eq!(position(7), Some((2, 0)));
        assert_eq!(position(9), Some((2, 2)));
        assert_eq!(position(10), None);
    }

    #[test]
    fn test_neighbors_exact() {
        assert_eq!(sorted(neighbors(0)), vec![1, 3, 4]);
        assert_eq!(sorted(neighbors(1)), vec![0, 2, 4, 5]);
        assert_eq!(sorted(neighbors(3)), vec![0, 4, 7]);
        assert_eq!(sorted(neighbors(4)), vec![0, 1, 3, 5, 7, 8]);
        assert_eq!(sorted(neighbors(6)), vec![2, 5, 9]);
        assert_eq!(sorted(neighbors(8)), vec![4, 5, 7, 9]);
        assert!(neighbors(12).is_empty());
    }

    #[test]
    fn test_wave_order_closest_first() {
        let order = wave_order(0);
        assert_eq!(order.len(), CELL_COUNT);
        assert_eq!(order[0], (0, 0));
        assert!(order.windows(2).all(|w| w[0].1 <= w[1].1));
        let far = order.iter().find(|&&(c, _)| c == 9).map(|&(_, d)| d);
        assert_eq!(far, Some(3));
    }

    #[test]
    fn test_board_press_moves_cell() {
        let mut board = Board::new();
        assert!(board.activate(4));
        assert!(board.press(4));
        assert!(!board.is_active(4));
        assert!(board.is_pressed(4));
        // Pressed cells cannot be re-lit
        assert!(!board.activate(4));
        assert!(board.is_consistent());
        assert_eq!(board.free().len(), CELL_COUNT - 1);
    }

    #[test]
    fn test_cell_set_ignores_out_of_range() {
        let mut set = CellSet::empty();
        assert!(!set.insert(10));
        assert!(set.is_empty());
        assert_eq!(CellSet::all().len(), CELL_COUNT);
        assert_eq!(CellSet::all().complement(), CellSet::empty());
    }

    proptest! {
        #[test]
        fn adjacency_is_symmetric(a in 0u8..10) {
            for b in neighbors(a) {
                prop_assert!(neighbors(b).contains(&a));
                prop_assert_ne!(a, b);
            }
        }

        #[test]
        fn board_stays_consistent(ops in proptest::collection::vec((0u8..4, 0u8..10), 0..64)) {
            let mut board = Board::new();
            for (op, cell) in ops {
                match op {
                    0 => { board.activate(cell); }
                    1 => { board.press(cell); }
                    2 => { board.mark_pressed(cell); }
                    _ => board.clear_active(),
                }
                prop_assert!(board.is_consistent());
            }
        }
    }
}
