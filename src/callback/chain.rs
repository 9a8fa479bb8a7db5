use std::fmt;
use std::sync::Arc;

use tracing::{Level, event, info_span};

use super::OperationKind;
use crate::scope::Scope;

/// Body of a stage. Stages report through the scope, never by return value.
pub type CallbackFn = dyn Fn(&mut Scope<'_>) + Send + Sync;

/// One named unit of behavior in a chain.
#[derive(Clone)]
pub struct Stage {
    name: Arc<str>,
    func: Arc<CallbackFn>,
}

impl Stage {
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, scope: &mut Scope<'_>) {
        (self.func)(scope)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}

/// Compiled, immutable snapshot of one operation's stages.
///
/// Cloning is cheap; a running chain is unaffected by later registry changes.
#[derive(Clone, Debug)]
pub struct Chain {
    kind: OperationKind,
    stages: Arc<[Stage]>,
}

impl Chain {
    pub fn new(kind: OperationKind, stages: Vec<Stage>) -> Self {
        Self {
            kind,
            stages: stages.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order. Halts before the next stage once the scope
    /// carries an error or the skip-remaining flag.
    pub fn run(&self, scope: &mut Scope<'_>) {
        let span = info_span!("callbacks", kind = %self.kind, table = %scope.table_name());
        let _enter = span.enter();

        for stage in self.stages.iter() {
            if scope.has_error() {
                event!(Level::DEBUG, stage = stage.name(), "halted on error");
                return;
            }
            if scope.skipped() {
                event!(Level::DEBUG, stage = stage.name(), "remaining stages skipped");
                return;
            }

            event!(Level::TRACE, stage = stage.name(), "running stage");
            stage.call(scope);
        }
    }
}
