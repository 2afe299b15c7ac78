//! # Integer Stack
//!
//! A LIFO stack of machine integers shared by every variant that has one.
//! Popping an empty stack yields 0 instead of faulting; programs in these
//! languages routinely rely on that.

use crate::error::{self, Result};
use serde::Serialize;

/// Maximum stack depth (prevents runaway pushes from eating memory)
pub const MAX_STACK_SIZE: usize = 1 << 20;

/// Binary stack operations. Each pops `b` (top) then `a` and pushes `a op b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Truncating division
    Div,
    /// Truncating remainder (sign follows the dividend)
    Mod,
    /// Floored division
    FloorDiv,
    /// Floored modulo (sign follows the divisor)
    FloorMod,
    /// 1 if `a > b`, else 0
    Greater,
    /// 1 if `a == b`, else 0
    Equal,
}

impl BinaryOp {
    fn divides(&self) -> bool {
        matches!(
            self,
            BinaryOp::Div | BinaryOp::Mod | BinaryOp::FloorDiv | BinaryOp::FloorMod
        )
    }

    fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => a.wrapping_div(b),
            BinaryOp::Mod => a.wrapping_rem(b),
            BinaryOp::FloorDiv => {
                let q = a.wrapping_div(b);
                if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                    q - 1
                } else {
                    q
                }
            }
            BinaryOp::FloorMod => {
                let r = a.wrapping_rem(b);
                if r != 0 && ((r < 0) != (b < 0)) {
                    r + b
                } else {
                    r
                }
            }
            BinaryOp::Greater => (a > b) as i64,
            BinaryOp::Equal => (a == b) as i64,
        }
    }
}

/// Integer stack
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stack {
    data: Vec<i64>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Stack {
            data: Vec::with_capacity(32),
        }
    }

    /// Current stack size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: i64) -> Result<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(error::stack_overflow(MAX_STACK_SIZE));
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack, 0 when empty
    pub fn pop(&mut self) -> i64 {
        self.data.pop().unwrap_or(0)
    }

    /// Peek at the top value, 0 when empty
    pub fn peek(&self) -> i64 {
        self.data.last().copied().unwrap_or(0)
    }

    /// Peek at a value at a specific depth (0 = top)
    pub fn peek_at(&self, depth: usize) -> Option<i64> {
        if depth >= self.data.len() {
            return None;
        }
        Some(self.data[self.data.len() - 1 - depth])
    }

    /// Duplicate the top value (an empty stack duplicates 0)
    pub fn dup(&mut self) -> Result<()> {
        let value = self.peek();
        self.push(value)
    }

    /// Push a copy of the value at depth N (0 = top); missing depths copy 0
    pub fn copy_n(&mut self, n: usize) -> Result<()> {
        let value = self.peek_at(n).unwrap_or(0);
        self.push(value)
    }

    /// Swap top two values, treating missing values as 0
    pub fn swap(&mut self) -> Result<()> {
        let b = self.pop();
        let a = self.pop();
        self.push(b)?;
        self.push(a)
    }

    /// Drop the top value
    pub fn discard(&mut self) {
        self.data.pop();
    }

    /// Drop N values beneath the top, keeping the top
    pub fn slide(&mut self, n: usize) {
        if let Some(top) = self.data.pop() {
            let keep = self.data.len().saturating_sub(n);
            self.data.truncate(keep);
            self.data.push(top);
        }
    }

    /// Rotate the top `depth` values by `count` positions.
    ///
    /// A positive count buries the top value `count` places down, a negative
    /// count does the reverse. Returns false and leaves the stack untouched
    /// when `depth` is not positive or exceeds the stack size.
    pub fn roll(&mut self, depth: i64, count: i64) -> bool {
        if depth <= 0 || depth as usize > self.data.len() {
            return false;
        }
        let depth = depth as usize;
        let start = self.data.len() - depth;
        let shift = count.rem_euclid(depth as i64) as usize;
        self.data[start..].rotate_right(shift);
        true
    }

    /// Apply a binary operation to the top two values.
    ///
    /// Division by zero faults unless `ignore` is set, in which case both
    /// operands are restored and nothing happens.
    pub fn binary(&mut self, op: BinaryOp, ignore: bool) -> Result<()> {
        let b = self.pop();
        let a = self.pop();
        if op.divides() && b == 0 {
            if ignore {
                self.push(a)?;
                return self.push(b);
            }
            return Err(error::division_by_zero());
        }
        self.push(op.apply(a, b))
    }

    /// Logical not: pushes 1 if the popped value is 0, else 0
    pub fn not(&mut self) -> Result<()> {
        let value = self.pop();
        self.push((value == 0) as i64)
    }

    /// Clear the entire stack
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get all values as a slice (bottom to top)
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    /// Up to `n` values from the top, top first
    pub fn top(&self, n: usize) -> Vec<i64> {
        self.data.iter().rev().take(n).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(values: &[i64]) -> Stack {
        let mut stack = Stack::new();
        for v in values {
            stack.push(*v).unwrap();
        }
        stack
    }

    #[test]
    fn test_push_pop() {
        let mut stack = stack_of(&[1, 2, 3]);
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), 3);
        assert_eq!(stack.pop(), 2);
        assert_eq!(stack.pop(), 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_empty_yields_zero() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), 0);
        assert_eq!(stack.peek(), 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_dup_and_swap() {
        let mut stack = stack_of(&[1, 2]);
        stack.swap().unwrap();
        assert_eq!(stack.as_slice(), &[2, 1]);
        stack.dup().unwrap();
        assert_eq!(stack.as_slice(), &[2, 1, 1]);

        let mut empty = Stack::new();
        empty.swap().unwrap();
        assert_eq!(empty.as_slice(), &[0, 0]);
    }

    #[test]
    fn test_copy_and_slide() {
        let mut stack = stack_of(&[10, 20, 30]);
        stack.copy_n(2).unwrap();
        assert_eq!(stack.peek(), 10);
        stack.slide(2);
        assert_eq!(stack.as_slice(), &[10, 10]);
    }

    #[test]
    fn test_binary_ops() {
        let mut stack = stack_of(&[7, 2]);
        stack.binary(BinaryOp::Sub, false).unwrap();
        assert_eq!(stack.pop(), 5);

        let mut stack = stack_of(&[-7, 2]);
        stack.binary(BinaryOp::Div, false).unwrap();
        assert_eq!(stack.pop(), -3);

        let mut stack = stack_of(&[-7, 2]);
        stack.binary(BinaryOp::FloorDiv, false).unwrap();
        assert_eq!(stack.pop(), -4);

        let mut stack = stack_of(&[-7, 3]);
        stack.binary(BinaryOp::FloorMod, false).unwrap();
        assert_eq!(stack.pop(), 2);

        let mut stack = stack_of(&[3, 2]);
        stack.binary(BinaryOp::Greater, false).unwrap();
        assert_eq!(stack.pop(), 1);
    }

    #[test]
    fn test_division_by_zero_policy() {
        let mut stack = stack_of(&[5, 0]);
        let err = stack.binary(BinaryOp::Div, false).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DivisionByZero);

        let mut stack = stack_of(&[5, 0]);
        stack.binary(BinaryOp::FloorMod, true).unwrap();
        assert_eq!(stack.as_slice(), &[5, 0]);
    }

    #[test]
    fn test_not() {
        let mut stack = stack_of(&[0, 4]);
        stack.not().unwrap();
        assert_eq!(stack.pop(), 0);
        stack.not().unwrap();
        assert_eq!(stack.pop(), 1);
    }

    #[test]
    fn test_roll() {
        let mut stack = stack_of(&[1, 2, 3, 4]);
        assert!(stack.roll(3, 1));
        assert_eq!(stack.as_slice(), &[1, 4, 2, 3]);

        assert!(stack.roll(3, -1));
        assert_eq!(stack.as_slice(), &[1, 2, 3, 4]);

        assert!(!stack.roll(0, 1));
        assert!(!stack.roll(5, 1));
        assert_eq!(stack.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_top_excerpt() {
        let stack = stack_of(&[1, 2, 3]);
        assert_eq!(stack.top(2), vec![3, 2]);
        assert_eq!(stack.top(10), vec![3, 2, 1]);
    }
}
