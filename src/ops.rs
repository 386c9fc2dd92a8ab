// SPDX-License-Identifier: MIT
//! Edit scripts in two representations and the algebra between them.
//!
//! An edit script is either a list of elementary operations ([`EditOp`]),
//! each touching a single symbol, or a list of block opcodes ([`OpCode`])
//! covering contiguous spans of both strings. Elementary scripts may omit
//! Keep operations (a *normalized* script contains none); opcode lists
//! always partition both strings completely.

use crate::distance::{common_prefix, common_suffix};
use crate::error::{ScriptError, SubtractError};
use crate::symbol::Symbol;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The four elementary edit-operation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Source and destination symbol agree at the aligned positions.
    Keep,
    /// Replace the source symbol with the destination symbol.
    Replace,
    /// Insert the destination symbol before the source position.
    Insert,
    /// Delete the source symbol.
    Delete,
}

impl EditKind {
    /// The kind of the same operation with source and destination
    /// exchanged: Insert and Delete swap, Keep and Replace are fixed.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Insert => Self::Delete,
            Self::Delete => Self::Insert,
            other => other,
        }
    }
}

/// An elementary edit operation at a source/destination position pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EditOp {
    /// Operation kind.
    pub kind: EditKind,
    /// Position in the source string, `<= len1`; `len1` only for Insert.
    pub spos: usize,
    /// Position in the destination string, `<= len2`; `len2` only for Delete.
    pub dpos: usize,
}

/// A block edit operation covering contiguous spans of both strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpCode {
    /// Operation kind.
    pub kind: EditKind,
    /// Source span start.
    pub sbeg: usize,
    /// Source span end (exclusive); equals `sbeg` for Insert.
    pub send: usize,
    /// Destination span start.
    pub dbeg: usize,
    /// Destination span end (exclusive); equals `dbeg` for Delete.
    pub dend: usize,
}

/// A maximal run of identical symbols shared by source and destination:
/// `s1[spos..spos + len] == s2[dpos..dpos + len]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchingBlock {
    /// Start of the run in the source string.
    pub spos: usize,
    /// Start of the run in the destination string.
    pub dpos: usize,
    /// Length of the run.
    pub len: usize,
}

// ---------------------------------------------------------------------------
// Script reconstruction
// ---------------------------------------------------------------------------

/// Finds an optimal normalized edit script transforming `s1` into `s2`.
///
/// The script length equals `distance(s1, s2, false)` and contains no
/// Keep operations. Among the optimal scripts, one is chosen
/// deterministically: the backtrack prefers continuing the direction of
/// the previous non-diagonal move, then Keep, then Replace, then Insert
/// before Delete.
///
/// ```
/// use rustlev::{apply_editops, editops};
///
/// let ops = editops(b"Levenshtein", b"Lenvinsten");
/// assert_eq!(ops.len(), 4);
/// assert_eq!(apply_editops(&ops, b"Levenshtein", b"Lenvinsten"), b"Lenvinsten");
/// ```
pub fn editops<T: Symbol>(s1: &[T], s2: &[T]) -> Vec<EditOp> {
    let pfx = common_prefix(s1, s2);
    let s1 = &s1[pfx..];
    let s2 = &s2[pfx..];
    let sfx = common_suffix(s1, s2);
    let s1 = &s1[..s1.len() - sfx];
    let s2 = &s2[..s2.len() - sfx];

    let nrows = s1.len() + 1;
    let ncols = s2.len() + 1;

    let mut matrix = vec![0usize; nrows * ncols];
    for (j, cell) in matrix.iter_mut().enumerate().take(ncols) {
        *cell = j;
    }
    for i in 1..nrows {
        matrix[i * ncols] = i;
    }

    for i in 1..nrows {
        let char1 = s1[i - 1];
        let mut x = i;
        for j in 1..ncols {
            let prev = matrix[(i - 1) * ncols + j - 1];
            let mut c3 = prev + usize::from(char1 != s2[j - 1]);
            x += 1;
            if x > c3 {
                x = c3;
            }
            c3 = matrix[(i - 1) * ncols + j] + 1;
            if x > c3 {
                x = c3;
            }
            matrix[i * ncols + j] = x;
        }
    }

    editops_from_cost_matrix(s1, s2, pfx, &matrix)
}

/// Finds an optimal opcode list transforming `s1` into `s2`.
///
/// The list partitions both strings; its non-Keep blocks cover exactly
/// the operations of [`editops`].
pub fn opcodes<T: Symbol>(s1: &[T], s2: &[T]) -> Vec<OpCode> {
    editops_to_opcodes(&editops(s1, s2), s1.len(), s2.len())
}

/// Backtracks a full cost matrix from the bottom-right corner, emitting
/// the chosen operations in reverse. `dir` remembers the last
/// non-diagonal move (-1 insert, +1 delete) so runs of the same kind
/// stay contiguous.
fn editops_from_cost_matrix<T: Symbol>(
    s1: &[T],
    s2: &[T],
    off: usize,
    matrix: &[usize],
) -> Vec<EditOp> {
    let nrows = s1.len() + 1;
    let ncols = s2.len() + 1;

    let dist = matrix[nrows * ncols - 1];
    let mut ops = vec![
        EditOp {
            kind: EditKind::Keep,
            spos: 0,
            dpos: 0,
        };
        dist
    ];

    let mut pos = dist;
    let mut i = nrows - 1;
    let mut j = ncols - 1;
    let mut p = nrows * ncols - 1;
    let mut dir = 0i32;
    while i != 0 || j != 0 {
        // prefer continuing in the same direction
        if dir < 0 && j != 0 && matrix[p] == matrix[p - 1] + 1 {
            pos -= 1;
            j -= 1;
            ops[pos] = EditOp {
                kind: EditKind::Insert,
                spos: i + off,
                dpos: j + off,
            };
            p -= 1;
            continue;
        }
        if dir > 0 && i != 0 && matrix[p] == matrix[p - ncols] + 1 {
            pos -= 1;
            i -= 1;
            ops[pos] = EditOp {
                kind: EditKind::Delete,
                spos: i + off,
                dpos: j + off,
            };
            p -= ncols;
            continue;
        }
        if i != 0 && j != 0 && matrix[p] == matrix[p - ncols - 1] && s1[i - 1] == s2[j - 1] {
            // a Keep step; normalized scripts do not store it
            i -= 1;
            j -= 1;
            p -= ncols + 1;
            dir = 0;
            continue;
        }
        if i != 0 && j != 0 && matrix[p] == matrix[p - ncols - 1] + 1 {
            pos -= 1;
            i -= 1;
            j -= 1;
            ops[pos] = EditOp {
                kind: EditKind::Replace,
                spos: i + off,
                dpos: j + off,
            };
            p -= ncols + 1;
            dir = 0;
            continue;
        }
        // a turn from insert to delete (or vice versa) never beats the
        // diagonal, so these only fire from the neutral direction
        if dir == 0 && j != 0 && matrix[p] == matrix[p - 1] + 1 {
            pos -= 1;
            j -= 1;
            ops[pos] = EditOp {
                kind: EditKind::Insert,
                spos: i + off,
                dpos: j + off,
            };
            p -= 1;
            dir = -1;
            continue;
        }
        if dir == 0 && i != 0 && matrix[p] == matrix[p - ncols] + 1 {
            pos -= 1;
            i -= 1;
            ops[pos] = EditOp {
                kind: EditKind::Delete,
                spos: i + off,
                dpos: j + off,
            };
            p -= ncols;
            dir = 1;
            continue;
        }
        unreachable!("lost in the cost matrix");
    }
    debug_assert_eq!(pos, 0);

    ops
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Checks whether `ops` is consistent and applicable as a partial edit
/// from a string of length `len1` to a string of length `len2`.
///
/// An empty script is valid.
pub fn check_editops(ops: &[EditOp], len1: usize, len2: usize) -> Result<(), ScriptError> {
    for (index, op) in ops.iter().enumerate() {
        if op.spos > len1 || op.dpos > len2 {
            return Err(ScriptError::OutOfBounds { index });
        }
        if op.spos == len1 && op.kind != EditKind::Insert {
            return Err(ScriptError::OutOfBounds { index });
        }
        if op.dpos == len2 && op.kind != EditKind::Delete {
            return Err(ScriptError::OutOfBounds { index });
        }
    }
    for (index, pair) in ops.windows(2).enumerate() {
        if pair[1].spos < pair[0].spos || pair[1].dpos < pair[0].dpos {
            return Err(ScriptError::OrderViolation { index: index + 1 });
        }
    }
    Ok(())
}

/// Checks whether `bops` is consistent and applicable as a complete edit
/// from a string of length `len1` to a string of length `len2`.
///
/// Unlike elementary scripts, an opcode list must tile both strings
/// exhaustively, so an empty list only passes for two empty strings.
pub fn check_opcodes(bops: &[OpCode], len1: usize, len2: usize) -> Result<(), ScriptError> {
    let (Some(first), Some(last)) = (bops.first(), bops.last()) else {
        return if len1 == 0 && len2 == 0 {
            Ok(())
        } else {
            Err(ScriptError::SpanMismatch)
        };
    };
    if first.sbeg != 0 || first.dbeg != 0 || last.send != len1 || last.dend != len2 {
        return Err(ScriptError::SpanMismatch);
    }

    for (index, b) in bops.iter().enumerate() {
        if b.send > len1 || b.dend > len2 {
            return Err(ScriptError::OutOfBounds { index });
        }
        if b.sbeg > b.send || b.dbeg > b.dend {
            return Err(ScriptError::MalformedBlock { index });
        }
        let sspan = b.send - b.sbeg;
        let dspan = b.dend - b.dbeg;
        let well_formed = match b.kind {
            EditKind::Keep | EditKind::Replace => sspan == dspan && dspan != 0,
            EditKind::Insert => sspan == 0 && dspan != 0,
            EditKind::Delete => sspan != 0 && dspan == 0,
        };
        if !well_formed {
            return Err(ScriptError::MalformedBlock { index });
        }
    }

    for (index, pair) in bops.windows(2).enumerate() {
        if pair[1].sbeg != pair[0].send || pair[1].dbeg != pair[0].dend {
            return Err(ScriptError::OrderViolation { index: index + 1 });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Inversion
// ---------------------------------------------------------------------------

/// Inverts the sense of `ops` in place: the script becomes a valid
/// partial edit for the source and destination strings with their roles
/// exchanged.
pub fn invert_editops(ops: &mut [EditOp]) {
    for op in ops {
        std::mem::swap(&mut op.spos, &mut op.dpos);
        op.kind = op.kind.inverse();
    }
}

/// Inverts the sense of `bops` in place, like [`invert_editops`].
pub fn invert_opcodes(bops: &mut [OpCode]) {
    for b in bops {
        std::mem::swap(&mut b.sbeg, &mut b.dbeg);
        std::mem::swap(&mut b.send, &mut b.dend);
        b.kind = b.kind.inverse();
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Applies a partial edit `ops` taking `s1` towards `s2`, returning the
/// edited string.
///
/// `ops` need not be a complete edit sequence; source runs not covered
/// by any operation are copied through unchanged. Validity is not
/// checked; run [`check_editops`] first for untrusted scripts.
pub fn apply_editops<T: Symbol>(ops: &[EditOp], s1: &[T], s2: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(ops.len() + s1.len());
    let mut spos = 0usize;
    for op in ops {
        // copy the untouched source run, including the kept symbol
        let run = op.spos - spos + usize::from(op.kind == EditKind::Keep);
        out.extend_from_slice(&s1[spos..spos + run]);
        spos += run;
        match op.kind {
            EditKind::Keep => {}
            EditKind::Delete => spos += 1,
            EditKind::Replace => {
                spos += 1;
                out.push(s2[op.dpos]);
            }
            EditKind::Insert => out.push(s2[op.dpos]),
        }
    }
    out.extend_from_slice(&s1[spos..]);
    out
}

/// Applies a complete block edit `bops` taking `s1` to `s2`, returning
/// the edited string.
///
/// Validity is not checked; run [`check_opcodes`] first for untrusted
/// lists.
pub fn apply_opcodes<T: Symbol>(bops: &[OpCode], s1: &[T], s2: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(s1.len() + s2.len());
    for b in bops {
        match b.kind {
            EditKind::Insert | EditKind::Replace => out.extend_from_slice(&s2[b.dbeg..b.dend]),
            EditKind::Keep => out.extend_from_slice(&s1[b.sbeg..b.send]),
            EditKind::Delete => {}
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Converts an elementary script into an opcode list tiling the whole of
/// both strings.
///
/// Keep operations in `ops` are ignored; Keep blocks are synthesized
/// from the position gaps between the remaining operations, and runs of
/// equal-kind operations at consistently advancing positions merge into
/// one block each.
pub fn editops_to_opcodes(ops: &[EditOp], len1: usize, len2: usize) -> Vec<OpCode> {
    let mut bops = Vec::new();
    let mut spos = 0usize;
    let mut dpos = 0usize;
    let mut k = 0usize;
    while k < ops.len() {
        while k < ops.len() && ops[k].kind == EditKind::Keep {
            k += 1;
        }
        if k == ops.len() {
            break;
        }
        if spos < ops[k].spos || dpos < ops[k].dpos {
            bops.push(OpCode {
                kind: EditKind::Keep,
                sbeg: spos,
                send: ops[k].spos,
                dbeg: dpos,
                dend: ops[k].dpos,
            });
            spos = ops[k].spos;
            dpos = ops[k].dpos;
        }
        let kind = ops[k].kind;
        let sbeg = spos;
        let dbeg = dpos;
        while k < ops.len() && ops[k].kind == kind && ops[k].spos == spos && ops[k].dpos == dpos {
            match kind {
                EditKind::Replace => {
                    spos += 1;
                    dpos += 1;
                }
                EditKind::Delete => spos += 1,
                EditKind::Insert => dpos += 1,
                EditKind::Keep => unreachable!(),
            }
            k += 1;
        }
        bops.push(OpCode {
            kind,
            sbeg,
            send: spos,
            dbeg,
            dend: dpos,
        });
    }
    if spos < len1 || dpos < len2 {
        debug_assert_eq!(len1 - spos, len2 - dpos);
        bops.push(OpCode {
            kind: EditKind::Keep,
            sbeg: spos,
            send: len1,
            dbeg: dpos,
            dend: len2,
        });
    }
    bops
}

/// Converts an opcode list into elementary operations, expanding each
/// non-Keep block into `max(source span, destination span)` atoms.
///
/// Keep blocks expand into Keep operations only when `keep_keep` is set;
/// otherwise the result is normalized.
pub fn opcodes_to_editops(bops: &[OpCode], keep_keep: bool) -> Vec<EditOp> {
    let mut ops = Vec::new();
    for b in bops {
        match b.kind {
            EditKind::Keep => {
                if keep_keep {
                    for j in 0..b.send - b.sbeg {
                        ops.push(EditOp {
                            kind: EditKind::Keep,
                            spos: b.sbeg + j,
                            dpos: b.dbeg + j,
                        });
                    }
                }
            }
            EditKind::Replace => {
                for j in 0..b.send - b.sbeg {
                    ops.push(EditOp {
                        kind: EditKind::Replace,
                        spos: b.sbeg + j,
                        dpos: b.dbeg + j,
                    });
                }
            }
            EditKind::Delete => {
                for j in 0..b.send - b.sbeg {
                    ops.push(EditOp {
                        kind: EditKind::Delete,
                        spos: b.sbeg + j,
                        dpos: b.dbeg,
                    });
                }
            }
            EditKind::Insert => {
                for j in 0..b.dend - b.dbeg {
                    ops.push(EditOp {
                        kind: EditKind::Insert,
                        spos: b.sbeg,
                        dpos: b.dbeg + j,
                    });
                }
            }
        }
    }
    ops
}

/// Copies `ops` without its Keep operations.
pub fn normalize_editops(ops: &[EditOp]) -> Vec<EditOp> {
    ops.iter()
        .filter(|op| op.kind != EditKind::Keep)
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Subtraction
// ---------------------------------------------------------------------------

/// Subtracts `sub`, an ordered subsequence of `ops`, from `ops`.
///
/// The remainder is the normalized script that, applied to the result of
/// applying `sub`, produces the same final string as applying `ops` to
/// the original source. Source positions in the remainder shift by +1
/// for every Insert and -1 for every Delete consumed from `sub`, since
/// those change the length of the intermediate string.
///
/// # Errors
///
/// [`SubtractError`] when `sub` is not an ordered subsequence of `ops`.
pub fn subtract_editops(ops: &[EditOp], sub: &[EditOp]) -> Result<Vec<EditOp>, SubtractError> {
    fn spos_shift(kind: EditKind) -> isize {
        match kind {
            EditKind::Keep | EditKind::Replace => 0,
            EditKind::Insert => 1,
            EditKind::Delete => -1,
        }
    }

    let nr = ops.iter().filter(|op| op.kind != EditKind::Keep).count();
    let nn = sub.iter().filter(|op| op.kind != EditKind::Keep).count();
    if nn > nr {
        return Err(SubtractError);
    }

    let mut rem = Vec::with_capacity(nr - nn);
    let mut shift = 0isize;
    let mut j = 0usize;
    for s in sub {
        while j < ops.len() && ops[j] != *s {
            if ops[j].kind != EditKind::Keep {
                let mut op = ops[j];
                op.spos = op.spos.wrapping_add_signed(shift);
                rem.push(op);
            }
            j += 1;
        }
        if j == ops.len() {
            return Err(SubtractError);
        }
        shift += spos_shift(s.kind);
        j += 1;
    }
    for op in &ops[j..] {
        if op.kind != EditKind::Keep {
            let mut op = *op;
            op.spos = op.spos.wrapping_add_signed(shift);
            rem.push(op);
        }
    }

    Ok(rem)
}

// ---------------------------------------------------------------------------
// Matching blocks
// ---------------------------------------------------------------------------

/// Reads off the maximal matching blocks induced by an optimal
/// elementary script: the Keep gaps between consecutive non-Keep
/// operations, plus a trailing block if the script stops short of the
/// string ends. Only non-trivial blocks are emitted.
pub fn editops_matching_blocks(ops: &[EditOp], len1: usize, len2: usize) -> Vec<MatchingBlock> {
    let mut blocks = Vec::new();
    let mut spos = 0usize;
    let mut dpos = 0usize;
    let mut k = 0usize;
    while k < ops.len() {
        while k < ops.len() && ops[k].kind == EditKind::Keep {
            k += 1;
        }
        if k == ops.len() {
            break;
        }
        if spos < ops[k].spos || dpos < ops[k].dpos {
            blocks.push(MatchingBlock {
                spos,
                dpos,
                len: ops[k].spos - spos,
            });
            spos = ops[k].spos;
            dpos = ops[k].dpos;
        }
        let kind = ops[k].kind;
        while k < ops.len() && ops[k].kind == kind && ops[k].spos == spos && ops[k].dpos == dpos {
            match kind {
                EditKind::Replace => {
                    spos += 1;
                    dpos += 1;
                }
                EditKind::Delete => spos += 1,
                EditKind::Insert => dpos += 1,
                EditKind::Keep => unreachable!(),
            }
            k += 1;
        }
    }
    if spos < len1 || dpos < len2 {
        debug_assert_eq!(len1 - spos, len2 - dpos);
        blocks.push(MatchingBlock {
            spos,
            dpos,
            len: len1 - spos,
        });
    }
    blocks
}

/// Reads off the matching blocks of an opcode list: its Keep blocks,
/// with adjacent Keeps merged.
pub fn opcodes_matching_blocks(bops: &[OpCode], len1: usize) -> Vec<MatchingBlock> {
    let mut blocks = Vec::new();
    let mut k = 0usize;
    while k < bops.len() {
        if bops[k].kind != EditKind::Keep {
            k += 1;
            continue;
        }
        let spos = bops[k].sbeg;
        let dpos = bops[k].dbeg;
        while k < bops.len() && bops[k].kind == EditKind::Keep {
            k += 1;
        }
        let len = if k == bops.len() {
            len1 - spos
        } else {
            bops[k].sbeg - spos
        };
        blocks.push(MatchingBlock { spos, dpos, len });
    }
    blocks
}
