// SPDX-License-Identifier: MIT

//! The interpreter state carried across a report descriptor.
//!
//! Only the Usage Page is tracked, it is needed to resolve Usages that
//! do not carry their own page. Push and Pop save and restore the state,
//! see Section 6.2.2.7.

use crate::item::{GlobalItem, SemanticItem};
use crate::types::UsagePage;

use log::debug;

/// One saved copy of the global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub usage_page: UsagePage,
}

/// The descriptor context is created per conversion and updated with
/// every item in stream order.
#[derive(Debug, Clone, Default)]
pub struct Context {
    current: Snapshot,
    stack: Vec<Snapshot>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn usage_page(&self) -> UsagePage {
        self.current.usage_page
    }

    /// The number of pushed snapshots.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn push(&mut self) {
        self.stack.push(self.current);
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(snapshot) => self.current = snapshot,
            None => debug!("Pop without Push, keeping usage page {:#06x}", self.current.usage_page.0),
        }
    }

    /// Apply one item to the context. Only Usage Page, Push and Pop
    /// have an effect.
    pub fn update(&mut self, item: &SemanticItem) {
        match item {
            SemanticItem::Global(GlobalItem::UsagePage(page)) => self.current.usage_page = *page,
            SemanticItem::Global(GlobalItem::Push) => self.push(),
            SemanticItem::Global(GlobalItem::Pop) => self.pop(),
            _ => {}
        }
    }
}
