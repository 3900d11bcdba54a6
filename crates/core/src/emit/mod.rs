//! Source text emission.
//!
//! Emitters build a [`GeneratedModule`] unit by unit so a later formatter
//! diagnostic can be traced back to the declaration or function at fault.

pub mod ast;
mod declarations;
mod requests;

pub use declarations::emit_declarations;
pub use requests::{RequestFunction, build_request_function, emit_requests};

/// What a generated module contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Interfaces and type aliases, one per definition.
    Declarations,
    /// One request function per operation.
    Requests,
}

/// Line range (1-based, inclusive) of one generated unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpan {
    /// Declaration or function name.
    pub name: String,
    /// First line of the unit.
    pub start_line: usize,
    /// Last line of the unit.
    pub end_line: usize,
}

/// A finished text artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// File name, e.g. `interface.ts`.
    pub name: String,
    /// What the module contains.
    pub kind: ModuleKind,
    /// Module source text.
    pub text: String,
    /// Line spans of each generated unit in emission order.
    pub units: Vec<UnitSpan>,
}

impl GeneratedModule {
    /// Name of the unit covering `line`, if any.
    pub fn unit_at(&self, line: usize) -> Option<&str> {
        self.units
            .iter()
            .find(|u| (u.start_line..=u.end_line).contains(&line))
            .map(|u| u.name.as_str())
    }

    /// Unit names in emission order.
    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }
}

pub(crate) const PREAMBLE: &str = "/* eslint-disable */\n// generated by swaggen\n";

/// Accumulates module text while recording unit line spans.
#[derive(Debug)]
pub(crate) struct ModuleBuilder {
    name: String,
    kind: ModuleKind,
    text: String,
    units: Vec<UnitSpan>,
}

impl ModuleBuilder {
    pub(crate) fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            text: String::new(),
            units: Vec::new(),
        }
    }

    fn next_line(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    fn push_block(&mut self, block: &str) {
        if !self.text.is_empty() && !self.text.ends_with("\n\n") {
            if !self.text.ends_with('\n') {
                self.text.push('\n');
            }
            self.text.push('\n');
        }
        self.text.push_str(block.trim_end_matches('\n'));
        self.text.push('\n');
    }

    /// Text that belongs to no unit (preamble, imports).
    pub(crate) fn push_raw(&mut self, block: &str) {
        if block.trim().is_empty() {
            return;
        }
        self.push_block(block);
    }

    pub(crate) fn push_unit(&mut self, name: &str, block: &str) {
        // Blank separator lines are attributed to no unit.
        let pending_sep = if self.text.is_empty() || self.text.ends_with("\n\n") {
            0
        } else if self.text.ends_with('\n') {
            1
        } else {
            2
        };
        let start_line = self.next_line() + pending_sep;
        self.push_block(block);
        let end_line = self.next_line() - 1;
        self.units.push(UnitSpan {
            name: name.to_string(),
            start_line,
            end_line,
        });
    }

    pub(crate) fn finish(self) -> GeneratedModule {
        GeneratedModule {
            name: self.name,
            kind: self.kind,
            text: self.text,
            units: self.units,
        }
    }
}
