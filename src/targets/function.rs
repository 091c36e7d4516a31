//! User-supplied target functions

use crate::core::{LogRecord, Result, Target, TargetContext};
use std::fmt;
use std::sync::Arc;

/// A target implemented by the application. It receives the formatted record
/// and the full context, and fires its own `logged`/`error` events.
pub type TargetFn = Arc<dyn Fn(&LogRecord, &mut TargetContext<'_>) -> Result<()> + Send + Sync>;

pub struct FunctionTarget {
    function: TargetFn,
}

impl FunctionTarget {
    pub fn new(function: TargetFn) -> Self {
        Self { function }
    }
}

impl fmt::Debug for FunctionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FunctionTarget(..)")
    }
}

impl Target for FunctionTarget {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()> {
        (self.function)(record, ctx)
    }

    fn name(&self) -> &str {
        "function"
    }
}
