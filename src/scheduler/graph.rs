//! The pass/block sequence cookers are placed into.
//!
//! A pass is one full traversal of the source data; a block is a sub-ordering
//! slot inside a pass for cookers that must see each other's output without a
//! new traversal. Both levels are append-only arenas addressed by index: pass 0
//! and block 0 of every pass always exist, and the next element can only be
//! created from the current tail.

use serde::Serialize;

use crate::core::TracecookError;

/// Index of a scheduling node inside its scheduler.
pub type NodeId = usize;

/// A `(pass, block)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Placement {
    /// Pass index
    pub pass: usize,
    /// Block index within the pass
    pub block: usize,
}

impl Placement {
    /// Pass 0, block 0.
    pub const ORIGIN: Self = Self {
        pass: 0,
        block: 0,
    };

    /// Create a placement.
    pub const fn new(pass: usize, block: usize) -> Self {
        Self {
            pass,
            block,
        }
    }
}

/// An ordered slot of nodes within one pass.
#[derive(Debug, Default)]
pub struct SchedulingBlock {
    index: usize,
    nodes: Vec<NodeId>,
}

impl SchedulingBlock {
    /// Position within the pass.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

/// One trip through the source data.
#[derive(Debug)]
pub struct SchedulingPass {
    index: usize,
    blocks: Vec<SchedulingBlock>,
}

impl SchedulingPass {
    fn new(index: usize) -> Self {
        Self {
            index,
            blocks: vec![SchedulingBlock::default()],
        }
    }

    /// Position in the pass sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Block 0, which always exists.
    pub fn block0(&self) -> &SchedulingBlock {
        &self.blocks[0]
    }

    /// All blocks in order.
    pub fn blocks(&self) -> &[SchedulingBlock] {
        &self.blocks
    }

    /// The block before `index`, if any.
    pub fn previous_block(&self, index: usize) -> Option<&SchedulingBlock> {
        index.checked_sub(1).and_then(|previous| self.blocks.get(previous))
    }

    /// The block after `index`, if it has been created.
    pub fn next_block(&self, index: usize) -> Option<&SchedulingBlock> {
        self.blocks.get(index + 1)
    }

    /// Number of node entries across all blocks.
    pub fn node_count(&self) -> usize {
        self.blocks.iter().map(|block| block.nodes.len()).sum()
    }

    /// Nodes of every block, flattened in block order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.blocks.iter().flat_map(|block| block.nodes.iter().copied())
    }

    fn create_next_block(&mut self, from: usize) -> Result<usize, TracecookError> {
        if from + 1 != self.blocks.len() {
            return Err(TracecookError::SchedulingGraphAppend {
                kind: "block",
                index: from,
            });
        }
        self.blocks.push(SchedulingBlock {
            index: self.blocks.len(),
            nodes: Vec::new(),
        });
        Ok(from + 1)
    }
}

/// The append-only sequence of passes.
#[derive(Debug)]
pub struct SchedulingGraph {
    passes: Vec<SchedulingPass>,
}

impl SchedulingGraph {
    /// A graph holding pass 0 with block 0.
    pub fn new() -> Self {
        Self {
            passes: vec![SchedulingPass::new(0)],
        }
    }

    /// Pass 0, which always exists.
    pub fn pass0(&self) -> &SchedulingPass {
        &self.passes[0]
    }

    /// Pass `index`, if it has been created.
    pub fn get_pass(&self, index: usize) -> Option<&SchedulingPass> {
        self.passes.get(index)
    }

    /// All passes in order.
    pub fn passes(&self) -> &[SchedulingPass] {
        &self.passes
    }

    /// Number of passes created so far.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// The pass before `index`, if any.
    pub fn previous_pass(&self, index: usize) -> Option<&SchedulingPass> {
        index.checked_sub(1).and_then(|previous| self.passes.get(previous))
    }

    /// The pass after `index`, if it has been created.
    pub fn next_pass(&self, index: usize) -> Option<&SchedulingPass> {
        self.passes.get(index + 1)
    }

    /// Append a pass after `from`, which must be the last pass.
    pub fn create_next_pass(&mut self, from: usize) -> Result<usize, TracecookError> {
        if from + 1 != self.passes.len() {
            return Err(TracecookError::SchedulingGraphAppend {
                kind: "pass",
                index: from,
            });
        }
        self.passes.push(SchedulingPass::new(from + 1));
        Ok(from + 1)
    }

    /// Index of the pass after `from`, creating it when `from` is the tail.
    pub fn next_pass_or_create(&mut self, from: usize) -> Result<usize, TracecookError> {
        if self.next_pass(from).is_some() {
            Ok(from + 1)
        } else {
            self.create_next_pass(from)
        }
    }

    /// Append a block after `from` in `pass`; `from` must be that pass's last block.
    pub fn create_next_block(&mut self, pass: usize, from: usize) -> Result<usize, TracecookError> {
        self.pass_mut(pass)?.create_next_block(from)
    }

    /// Index of the block after `from` in `pass`, creating it when `from` is the tail.
    pub fn next_block_or_create(&mut self, pass: usize, from: usize) -> Result<usize, TracecookError> {
        let target = self.pass_mut(pass)?;
        if target.next_block(from).is_some() {
            Ok(from + 1)
        } else {
            target.create_next_block(from)
        }
    }

    /// Append `node` to the block at `placement`.
    pub fn push_node(&mut self, placement: Placement, node: NodeId) -> Result<(), TracecookError> {
        let block = self.pass_mut(placement.pass)?.blocks.get_mut(placement.block).ok_or(
            TracecookError::SchedulingGraphAppend {
                kind: "block",
                index: placement.block,
            },
        )?;
        block.nodes.push(node);
        Ok(())
    }

    /// Number of node entries across every pass.
    pub fn node_count(&self) -> usize {
        self.passes.iter().map(SchedulingPass::node_count).sum()
    }

    fn pass_mut(&mut self, index: usize) -> Result<&mut SchedulingPass, TracecookError> {
        self.passes.get_mut(index).ok_or(TracecookError::SchedulingGraphAppend {
            kind: "pass",
            index,
        })
    }
}

impl Default for SchedulingGraph {
    fn default() -> Self {
        Self::new()
    }
}
