use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::compile::PredicateCompiler;
use crate::loader::FieldLoader;
use crate::theme::Theme;

/// Construction-time configuration of an [`Interact`](crate::Interact) session.
#[derive(Clone)]
pub struct InteractOptions {
    /// Per-name defaults that take precedence over a field's own default.
    pub defaults: Map<String, Value>,
    pub loader: Option<Arc<dyn FieldLoader>>,
    pub compiler: Option<Arc<dyn PredicateCompiler>>,
    pub masked: bool,
    pub theme: Theme,
    /// Terminate the process with status 130 once an interrupt has released
    /// the terminal and reached the sink. Unset means terminal sessions exit
    /// and sessions over an injected reader do not.
    pub exit_on_interrupt: Option<bool>,
    pub sink_capacity: usize,
}

impl Default for InteractOptions {
    fn default() -> Self {
        Self {
            defaults: Map::new(),
            loader: None,
            compiler: None,
            masked: false,
            theme: Theme::plain(),
            exit_on_interrupt: None,
            sink_capacity: 1,
        }
    }
}

impl InteractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    pub fn with_loader(mut self, loader: impl FieldLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn with_compiler(mut self, compiler: impl PredicateCompiler + 'static) -> Self {
        self.compiler = Some(Arc::new(compiler));
        self
    }

    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn exit_on_interrupt(mut self, exit: bool) -> Self {
        self.exit_on_interrupt = Some(exit);
        self
    }

    /// Events buffered ahead of the consumer. Clamped to at least one.
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity.max(1);
        self
    }
}

impl fmt::Debug for InteractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractOptions")
            .field("defaults", &self.defaults)
            .field("loader", &self.loader.is_some())
            .field("compiler", &self.compiler.is_some())
            .field("masked", &self.masked)
            .field("theme", &self.theme)
            .field("exit_on_interrupt", &self.exit_on_interrupt)
            .field("sink_capacity", &self.sink_capacity)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub autosubmit: bool,
}

impl RunOptions {
    pub fn interactive() -> Self {
        Self { autosubmit: false }
    }

    pub fn autosubmit() -> Self {
        Self { autosubmit: true }
    }
}
