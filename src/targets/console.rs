//! Console target

use crate::core::{LogRecord, Result, Target, TargetContext};
use std::io::{self, Write};

/// Writes each rendered record as one line on standard output
#[derive(Debug, Default)]
pub struct ConsoleTarget;

impl ConsoleTarget {
    pub fn new() -> Self {
        Self
    }
}

impl Target for ConsoleTarget {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", record.rendered())?;
        ctx.logged(record);
        Ok(())
    }

    fn flush(&mut self, _ctx: &mut TargetContext<'_>) -> Result<()> {
        io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
