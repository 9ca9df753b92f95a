//! Immutable snapshots of the call site that created a record.

use std::fmt;
use std::panic::Location;

use serde::{Deserialize, Serialize};

/// Execution context a [`Callpoint`] is captured from.
///
/// Built by [`callpoint!`](crate::callpoint!) or by hand when a test wants a
/// fixed call site. Missing pieces stay empty/zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext<'a> {
    /// Function the call was made from.
    pub func_name: &'a str,
    /// Source line.
    pub lineno: u32,
    /// Rust module path (`crate::module`).
    pub module_name: &'a str,
    /// Source file path.
    pub module_path: &'a str,
    /// Column within the line.
    pub offset: u32,
}

/// Where a record was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Callpoint {
    func_name: String,
    lineno: u32,
    module_name: String,
    module_path: String,
    offset: u32,
}

impl Callpoint {
    /// Builds a callpoint from an execution context. Never fails.
    pub fn from_context(context: Option<&CallContext<'_>>) -> Self {
        let Some(ctx) = context else {
            return Self::default();
        };
        Self {
            func_name: ctx.func_name.to_string(),
            lineno: ctx.lineno,
            module_name: ctx.module_name.to_string(),
            module_path: ctx.module_path.to_string(),
            offset: ctx.offset,
        }
    }

    /// Captures the caller's source location.
    ///
    /// Only the file, line, and column are known here; use
    /// [`callpoint!`](crate::callpoint!) to also get the module and function.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub(crate) fn from_location(loc: &Location<'_>) -> Self {
        Self::from_context(Some(&CallContext {
            module_path: loc.file(),
            lineno: loc.line(),
            offset: loc.column(),
            ..CallContext::default()
        }))
    }

    /// Function the record was created in; empty when unknown.
    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    /// Source line, or 0.
    pub fn lineno(&self) -> u32 {
        self.lineno
    }

    /// Module path of the call site, when captured by [`callpoint!`](crate::callpoint!).
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Source file of the call site.
    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    /// Fine-grained position within the line (the column).
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// True when every field holds its empty/zero sentinel.
    pub fn is_empty(&self) -> bool {
        self.func_name.is_empty()
            && self.lineno == 0
            && self.module_name.is_empty()
            && self.module_path.is_empty()
            && self.offset == 0
    }
}

impl fmt::Display for Callpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<Callpoint>");
        }
        write!(
            f,
            "Callpoint({:?}, {}, {:?}, {:?}, {})",
            self.func_name, self.lineno, self.module_name, self.module_path, self.offset
        )
    }
}

/// Captures a [`Callpoint`] for the enclosing function.
///
/// ```
/// fn handler() -> entrylog::callpoint::Callpoint {
///     entrylog::callpoint!()
/// }
/// let cp = handler();
/// assert!(cp.func_name().ends_with("handler"));
/// assert!(cp.lineno() > 0);
/// ```
#[macro_export]
macro_rules! callpoint {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let func = name.strip_suffix("::__here").unwrap_or(name);
        let func = func.strip_suffix("::{{closure}}").unwrap_or(func);
        $crate::callpoint::Callpoint::from_context(Some(&$crate::callpoint::CallContext {
            func_name: func,
            lineno: line!(),
            module_name: module_path!(),
            module_path: file!(),
            offset: column!(),
        }))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_yields_sentinels() {
        let cp = Callpoint::from_context(None);
        assert!(cp.is_empty());
        assert_eq!(cp.to_string(), "<Callpoint>");
    }

    #[test]
    fn display_joins_all_fields() {
        let cp = Callpoint::from_context(Some(&CallContext {
            func_name: "load",
            lineno: 42,
            module_name: "app::db",
            module_path: "src/db.rs",
            offset: 9,
        }));
        assert_eq!(
            cp.to_string(),
            r#"Callpoint("load", 42, "app::db", "src/db.rs", 9)"#
        );
    }

    #[test]
    fn caller_points_at_this_file() {
        let cp = Callpoint::caller();
        assert!(cp.module_path().ends_with("callpoint.rs"));
        assert!(cp.lineno() > 0);
        assert!(cp.func_name().is_empty());
    }

    #[test]
    fn macro_captures_module_and_function() {
        let cp = crate::callpoint!();
        assert_eq!(cp.module_name(), module_path!());
        assert!(cp.func_name().ends_with("macro_captures_module_and_function"));
    }
}
