use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::{Cell, CellIndex};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("cell '{0}' is already defined")]
    DuplicateCell(String),

    #[error("hierarchy root has not been resolved")]
    NotResolved,

    #[error("database contains no cells")]
    EmptyDatabase,

    #[error("instance references cell index {0} which does not exist")]
    UnknownCell(CellIndex),

    #[error("reference cycle detected: cell '{parent}' reaches back into '{child}'")]
    CycleDetected { parent: String, child: String },
}

/// DFS mark used during root resolution.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Finished,
}

/// The design database: owns every cell and resolves the root of the
/// reference hierarchy.
///
/// Construction is incremental (`add_cell`, then populate each cell's nodes
/// and layout through `cell_mut`); once [`DesignDb::resolve_root`] has run,
/// the database is finalized and read-only.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DesignDb {
    cells: Vec<Cell>,
    name_index: HashMap<String, CellIndex>,
    root: Option<CellIndex>,
    resolved: bool,
}

impl DesignDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Cell management ──────────────────────────────────────────────

    /// Register a new, empty cell under a unique name and return its index.
    ///
    /// # Panics
    ///
    /// Panics if the database has already been finalized by
    /// [`DesignDb::resolve_root`]; adding cells afterwards is a caller bug.
    pub fn add_cell(&mut self, name: &str) -> Result<CellIndex, DbError> {
        assert!(
            !self.resolved,
            "add_cell called after the database was finalized"
        );
        if self.name_index.contains_key(name) {
            return Err(DbError::DuplicateCell(name.to_string()));
        }
        let idx = self.cells.len();
        self.cells.push(Cell::new(name));
        self.name_index.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn cell(&self, idx: CellIndex) -> Option<&Cell> {
        self.cells.get(idx)
    }

    pub fn cell_mut(&mut self, idx: CellIndex) -> Option<&mut Cell> {
        self.cells.get_mut(idx)
    }

    pub fn cell_index(&self, name: &str) -> Option<CellIndex> {
        self.name_index.get(name).copied()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    // ── Root resolution ──────────────────────────────────────────────

    /// Resolve the root of the cell hierarchy and finalize the database.
    ///
    /// Runs an iterative depth-first traversal from every still-unvisited
    /// cell, visiting each cell's subcell references in node insertion
    /// order. Cells are recorded in finish order across all traversals; the
    /// root is the cell finished last, i.e. a cell no other cell references.
    ///
    /// When the hierarchy has several disconnected components, the root is
    /// the top of whichever component was started last. That choice is
    /// deterministic but an artifact of start order, not a contract.
    ///
    /// Reference cycles (including self-references) are rejected with
    /// [`DbError::CycleDetected`].
    pub fn resolve_root(&mut self) -> Result<(), DbError> {
        if self.cells.is_empty() {
            self.resolved = true;
            return Ok(());
        }

        let mut marks = vec![Mark::Unvisited; self.cells.len()];
        let mut finish_order: Vec<CellIndex> = Vec::with_capacity(self.cells.len());

        for start in 0..self.cells.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            self.dfs_from(start, &mut marks, &mut finish_order)?;
        }

        // Last finished over all traversals: referenced by no other cell.
        if let Some(&root) = finish_order.last() {
            self.root = Some(root);
            log::info!(
                "resolved hierarchy root to cell '{}' ({} cells)",
                self.cells[root].name,
                self.cells.len()
            );
        }
        self.resolved = true;
        Ok(())
    }

    fn dfs_from(
        &self,
        start: CellIndex,
        marks: &mut [Mark],
        finish_order: &mut Vec<CellIndex>,
    ) -> Result<(), DbError> {
        // Explicit stack of (cell, next node cursor) frames.
        let mut stack: Vec<(CellIndex, usize)> = vec![(start, 0)];
        marks[start] = Mark::InProgress;

        while let Some(&(idx, cursor)) = stack.last() {
            let nodes = self.cells[idx].nodes();
            let mut next_child = None;
            let mut cur = cursor;
            while cur < nodes.len() {
                let node = &nodes[cur];
                cur += 1;
                let Some(child) = node.subcell() else {
                    continue;
                };
                if child >= self.cells.len() {
                    return Err(DbError::UnknownCell(child));
                }
                match marks[child] {
                    Mark::Unvisited => {
                        next_child = Some(child);
                        break;
                    }
                    Mark::InProgress => {
                        return Err(DbError::CycleDetected {
                            parent: self.cells[idx].name.clone(),
                            child: self.cells[child].name.clone(),
                        });
                    }
                    Mark::Finished => {}
                }
            }
            let top = stack.len() - 1;
            stack[top].1 = cur;
            match next_child {
                Some(child) => {
                    marks[child] = Mark::InProgress;
                    stack.push((child, 0));
                }
                None => {
                    marks[idx] = Mark::Finished;
                    finish_order.push(idx);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// The resolved root cell of the hierarchy.
    pub fn root(&self) -> Result<CellIndex, DbError> {
        if !self.resolved {
            return Err(DbError::NotResolved);
        }
        self.root.ok_or(DbError::EmptyDatabase)
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
