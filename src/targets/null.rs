//! Null target: no I/O, only events

use crate::core::{LogRecord, Result, Target, TargetContext};

/// Reports every record as logged without writing it anywhere.
///
/// The `logged` event carries its own copy of the record, so subscribers never
/// observe later mutations made further up the ancestor walk.
#[derive(Debug, Default)]
pub struct NullTarget;

impl NullTarget {
    pub fn new() -> Self {
        Self
    }
}

impl Target for NullTarget {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()> {
        ctx.logged(record);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
