use std::any::Any;
use std::fmt;

use tessel_syntax::CharTable;

/// Per-edit inputs owned by the caller.
#[derive(Clone, Copy)]
pub struct ReparseContext<'a> {
    /// Intern table for the reparsed text.
    pub char_table: &'a CharTable,
    /// Opaque resolution context handed to `ReparseRules::is_reparseable`
    /// (the project, a module graph). `&()` when there is none.
    pub resolve: &'a dyn Any,
}

impl<'a> ReparseContext<'a> {
    pub fn new(char_table: &'a CharTable) -> Self {
        ReparseContext {
            char_table,
            resolve: &(),
        }
    }

    #[must_use]
    pub fn with_resolve(mut self, resolve: &'a dyn Any) -> Self {
        self.resolve = resolve;
        self
    }
}

impl fmt::Debug for ReparseContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReparseContext").finish_non_exhaustive()
    }
}
