//! Ping-pong roles for the radix passes.
//!
//! A pass never reads and writes the same key/id storage. Instead of swapping
//! references, the role a physical slot plays in pass `p` is derived from
//! `p % 2`: even passes read `A` and write `B`, odd passes the reverse.

/// Physical buffer of a pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferSlot {
    A,
    B,
}

/// Logical role of a slot within one pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassRole {
    Input,
    Output,
}

impl BufferSlot {
    /// Slot playing `role` in pass `pass`.
    pub fn for_pass(pass: usize, role: PassRole) -> Self {
        match (pass % 2, role) {
            (0, PassRole::Input) | (1, PassRole::Output) => BufferSlot::A,
            _ => BufferSlot::B,
        }
    }

    /// Slot holding the result after `pass_count` passes.
    ///
    /// With zero passes the data never left its initial slot.
    pub fn after_passes(pass_count: usize) -> Self {
        match pass_count.checked_sub(1) {
            Some(last) => Self::for_pass(last, PassRole::Output),
            None => BufferSlot::A,
        }
    }
}

/// Two buffers whose roles alternate between passes.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    a: T,
    b: T,
}

impl<T> PingPong<T> {
    /// `a` holds the initial data.
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn get(&self, slot: BufferSlot) -> &T {
        match slot {
            BufferSlot::A => &self.a,
            BufferSlot::B => &self.b,
        }
    }

    pub fn input(&self, pass: usize) -> &T {
        self.get(BufferSlot::for_pass(pass, PassRole::Input))
    }

    pub fn output(&self, pass: usize) -> &T {
        self.get(BufferSlot::for_pass(pass, PassRole::Output))
    }

    /// Disjoint borrows of this pass's input and output.
    pub fn split(&mut self, pass: usize) -> (&T, &mut T) {
        match BufferSlot::for_pass(pass, PassRole::Input) {
            BufferSlot::A => (&self.a, &mut self.b),
            BufferSlot::B => (&self.b, &mut self.a),
        }
    }

    pub fn into_slot(self, slot: BufferSlot) -> T {
        match slot {
            BufferSlot::A => self.a,
            BufferSlot::B => self.b,
        }
    }
}
