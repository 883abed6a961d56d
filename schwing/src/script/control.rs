//! Block matching for `If` / `Else` / `While`.
//!
//! Blocks are never parsed into a tree.  A control instruction jumps to its
//! partner by scanning the flat instruction list, counting nested openers and
//! closers until the depth returns to zero:
//!
//! | at | scans | for | nested opener |
//! |----|-------|-----|---------------|
//! | `While-start` (false) | forward | `While-end` | `While-start` |
//! | `While-end` | backward | `While-start` | `While-end` |
//! | `If-start` (false) | forward | `Else-start` | `If-start` |
//! | `Else-start` | forward | `If-end` | `Else-start` |
//!
//! The partners never change after a program is loaded, so [`JumpTable`]
//! runs every scan once up front.  A scan that runs off the program records
//! no target; the error is raised only if that jump is actually taken.

use super::lexer::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    WhileStart,
    WhileEnd,
    IfStart,
    ElseStart,
    IfEnd,
}

impl Block {
    pub const ALL: [Block; 5] = [
        Block::WhileStart,
        Block::WhileEnd,
        Block::IfStart,
        Block::ElseStart,
        Block::IfEnd,
    ];

    pub fn from_keyword(s: &str) -> Option<Block> {
        Block::ALL.into_iter().find(|b| b.keyword() == s)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Block::WhileStart => "While-start",
            Block::WhileEnd => "While-end",
            Block::IfStart => "If-start",
            Block::ElseStart => "Else-start",
            Block::IfEnd => "If-end",
        }
    }

    /// `(nested opener, partner, direction)` for blocks that jump.
    fn scan_spec(self) -> Option<(Block, Block, Direction)> {
        match self {
            Block::WhileStart => Some((Block::WhileStart, Block::WhileEnd, Direction::Forward)),
            Block::WhileEnd => Some((Block::WhileEnd, Block::WhileStart, Direction::Backward)),
            Block::IfStart => Some((Block::IfStart, Block::ElseStart, Direction::Forward)),
            Block::ElseStart => Some((Block::ElseStart, Block::IfEnd, Direction::Forward)),
            Block::IfEnd => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Depth-tracked search for the partner of the block at `from`.
///
/// Starts one step past `from`.  Returns `None` when the scan runs off
/// either end of the program.
pub fn scan(
    kinds: &[Option<Block>],
    from: usize,
    opener: Block,
    partner: Block,
    direction: Direction,
) -> Option<usize> {
    let mut depth = 1usize;
    let mut pc = from;
    loop {
        pc = match direction {
            Direction::Forward => Some(pc + 1).filter(|&p| p < kinds.len())?,
            Direction::Backward => pc.checked_sub(1)?,
        };
        match kinds[pc] {
            Some(k) if k == opener => depth += 1,
            Some(k) if k == partner => {
                depth -= 1;
                if depth == 0 {
                    return Some(pc);
                }
            }
            _ => {}
        }
    }
}

/// Precomputed block partners, indexed by program counter.
#[derive(Debug, Default, Clone)]
pub struct JumpTable {
    kinds: Vec<Option<Block>>,
    targets: Vec<Option<usize>>,
}

impl JumpTable {
    pub fn build<S: AsRef<str>>(lines: &[S]) -> Self {
        let kinds: Vec<Option<Block>> = lines
            .iter()
            .map(|l| tokenize(l.as_ref()).first().and_then(|t| Block::from_keyword(t)))
            .collect();

        let targets = kinds
            .iter()
            .enumerate()
            .map(|(pc, kind)| {
                let (opener, partner, dir) = kind.and_then(Block::scan_spec)?;
                scan(&kinds, pc, opener, partner, dir)
            })
            .collect();

        JumpTable { kinds, targets }
    }

    pub fn kind(&self, pc: usize) -> Option<Block> {
        self.kinds.get(pc).copied().flatten()
    }

    /// Partner line of the control instruction at `pc`, if it has one.
    pub fn target(&self, pc: usize) -> Option<usize> {
        self.targets.get(pc).copied().flatten()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
