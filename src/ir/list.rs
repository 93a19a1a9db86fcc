//! Doubly linked instruction lists threaded through the instruction
//! arena.

use super::{Block, Inst, InstData};
use crate::entity::{EntityRef, EntityVec};
use crate::errors::IrError;

pub type InstArena = EntityVec<Inst, InstData>;

/// Head, tail and cached length of a list whose `prev`/`next` links
/// live in the `InstData` entries of an `InstArena`. A list value does
/// not borrow the arena; every operation takes it explicitly.
///
/// Invariant: walking `next` from `head` visits exactly `len`
/// instructions and ends at `tail`, and every `prev` link mirrors the
/// `next` link pointing at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstList {
    head: Inst,
    tail: Inst,
    len: usize,
}

impl Default for InstList {
    fn default() -> Self {
        InstList {
            head: Inst::invalid(),
            tail: Inst::invalid(),
            len: 0,
        }
    }
}

impl InstList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<Inst> {
        self.head.maybe_index().map(|_| self.head)
    }

    pub fn tail(&self) -> Option<Inst> {
        self.tail.maybe_index().map(|_| self.tail)
    }

    pub fn append(&mut self, arena: &mut InstArena, inst: Inst) {
        arena[inst].prev = self.tail;
        arena[inst].next = Inst::invalid();
        match self.tail() {
            Some(tail) => arena[tail].next = inst,
            None => self.head = inst,
        }
        self.tail = inst;
        self.len += 1;
    }

    pub fn prepend(&mut self, arena: &mut InstArena, inst: Inst) {
        arena[inst].prev = Inst::invalid();
        arena[inst].next = self.head;
        match self.head() {
            Some(head) => arena[head].prev = inst,
            None => self.tail = inst,
        }
        self.head = inst;
        self.len += 1;
    }

    /// Link `inst` immediately before `before`, which must be on this
    /// list.
    pub fn insert_before(&mut self, arena: &mut InstArena, before: Inst, inst: Inst) {
        let prev = arena[before].prev;
        arena[inst].prev = prev;
        arena[inst].next = before;
        arena[before].prev = inst;
        if prev.is_valid() {
            arena[prev].next = inst;
        } else {
            self.head = inst;
        }
        self.len += 1;
    }

    /// Detach `inst`, which must be on this list. The instruction
    /// stays in the arena with cleared links.
    pub fn unlink(&mut self, arena: &mut InstArena, inst: Inst) {
        let prev = arena[inst].prev;
        let next = arena[inst].next;
        if prev.is_valid() {
            arena[prev].next = next;
        } else {
            self.head = next;
        }
        if next.is_valid() {
            arena[next].prev = prev;
        } else {
            self.tail = prev;
        }
        let data = &mut arena[inst];
        data.prev = Inst::invalid();
        data.next = Inst::invalid();
        data.block = Block::invalid();
        self.len -= 1;
    }

    /// Splice `back` onto the end of this list.
    pub fn concat(&mut self, arena: &mut InstArena, back: InstList) {
        if back.is_empty() {
            return;
        }
        match self.tail() {
            None => *self = back,
            Some(tail) => {
                arena[tail].next = back.head;
                arena[back.head].prev = tail;
                self.tail = back.tail;
                self.len += back.len;
            }
        }
    }

    /// Cut the list before `at`: this list keeps everything preceding
    /// `at` and the returned list starts at `at`.
    pub fn split_off(&mut self, arena: &mut InstArena, at: Inst) -> InstList {
        let mut len = 0;
        let mut cur = at;
        while cur.is_valid() {
            len += 1;
            cur = arena[cur].next;
        }
        let suffix = InstList {
            head: at,
            tail: self.tail,
            len,
        };
        let prev = arena[at].prev;
        if prev.is_valid() {
            arena[prev].next = Inst::invalid();
            arena[at].prev = Inst::invalid();
            self.tail = prev;
        } else {
            self.head = Inst::invalid();
            self.tail = Inst::invalid();
        }
        self.len -= len;
        suffix
    }

    /// Unlink every instruction whose `mark` flag is set. Returns how
    /// many were removed.
    pub fn remove_marked(&mut self, arena: &mut InstArena) -> usize {
        let marked = self
            .iter(arena)
            .filter(|&inst| arena[inst].mark)
            .collect::<Vec<_>>();
        for &inst in &marked {
            self.unlink(arena, inst);
            arena[inst].mark = false;
        }
        marked.len()
    }

    pub fn iter<'a>(&self, arena: &'a InstArena) -> InstIter<'a> {
        InstIter {
            arena,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Check the list invariant, and that each member records `block`
    /// as its parent (skipped when `block` is invalid, for lists not
    /// yet placed in a block).
    pub fn validate(&self, arena: &InstArena, block: Block) -> Result<(), IrError> {
        let mut count = 0;
        let mut prev = Inst::invalid();
        let mut cur = self.head;
        while cur.is_valid() {
            let data = arena
                .get(cur)
                .ok_or(IrError::BrokenLink { block, inst: cur })?;
            if data.prev != prev || count > arena.len() {
                return Err(IrError::BrokenLink { block, inst: cur });
            }
            if block.is_valid() && data.block != block {
                return Err(IrError::WrongParent {
                    inst: cur,
                    expected: block,
                    actual: data.block,
                });
            }
            count += 1;
            prev = cur;
            cur = data.next;
        }
        if prev != self.tail {
            return Err(IrError::BrokenLink {
                block,
                inst: self.tail,
            });
        }
        if count != self.len {
            return Err(IrError::ListLength {
                block,
                cached: self.len,
                actual: count,
            });
        }
        Ok(())
    }
}

/// Iterates a list front-to-back, or back-to-front with `.rev()`.
pub struct InstIter<'a> {
    arena: &'a InstArena,
    front: Inst,
    back: Inst,
    remaining: usize,
}

impl<'a> Iterator for InstIter<'a> {
    type Item = Inst;

    fn next(&mut self) -> Option<Inst> {
        if self.remaining == 0 {
            return None;
        }
        let inst = self.front;
        self.front = self.arena[inst].next;
        self.remaining -= 1;
        Some(inst)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> DoubleEndedIterator for InstIter<'a> {
    fn next_back(&mut self) -> Option<Inst> {
        if self.remaining == 0 {
            return None;
        }
        let inst = self.back;
        self.back = self.arena[inst].prev;
        self.remaining -= 1;
        Some(inst)
    }
}

impl<'a> ExactSizeIterator for InstIter<'a> {}
