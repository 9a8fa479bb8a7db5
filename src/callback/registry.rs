use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, info};

use super::{Chain, OperationKind, Stage};
use crate::core::{DbError, Result};
use crate::scope::Scope;

#[derive(Default)]
struct RegistryState {
    processors: HashMap<OperationKind, Vec<Stage>>,
    compiled: HashMap<OperationKind, Chain>,
}

impl RegistryState {
    fn stages_mut(&mut self, kind: OperationKind) -> &mut Vec<Stage> {
        self.compiled.remove(&kind);
        self.processors.entry(kind).or_default()
    }
}

/// Ordered, named stages for every operation kind.
///
/// Expected to be populated once at start-up and compiled many times after.
/// Every mutation invalidates the cached chain of the affected kind only.
#[derive(Default)]
pub struct Callback {
    state: RwLock<RegistryState>,
}

impl Callback {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the given chains, in order.
    pub fn from_stages(chains: impl IntoIterator<Item = (OperationKind, Vec<Stage>)>) -> Self {
        let state = RegistryState {
            processors: chains.into_iter().collect(),
            compiled: HashMap::new(),
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Append a stage. Names are unique per operation kind.
    pub fn register<F>(&self, kind: OperationKind, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        let mut state = self.state.write()?;
        let stages = state.stages_mut(kind);
        ensure_unique(stages, kind, name)?;

        debug!(%kind, name, "registering callback");
        stages.push(Stage::new(name, func));
        Ok(())
    }

    pub fn insert_before<F>(&self, kind: OperationKind, anchor: &str, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        self.insert_at(kind, anchor, 0, name, Stage::new(name, func))
    }

    pub fn insert_after<F>(&self, kind: OperationKind, anchor: &str, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        self.insert_at(kind, anchor, 1, name, Stage::new(name, func))
    }

    fn insert_at(
        &self,
        kind: OperationKind,
        anchor: &str,
        offset: usize,
        name: &str,
        stage: Stage,
    ) -> Result<()> {
        let mut state = self.state.write()?;
        let stages = state.stages_mut(kind);
        ensure_unique(stages, kind, name)?;

        let index = position(stages, kind, anchor)?;
        debug!(%kind, name, anchor, "inserting callback");
        stages.insert(index + offset, stage);
        Ok(())
    }

    /// Swap the body of an existing stage, keeping its position.
    pub fn replace<F>(&self, kind: OperationKind, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        let mut state = self.state.write()?;
        let stages = state.stages_mut(kind);
        let index = position(stages, kind, name)?;

        info!(%kind, name, "replacing callback");
        stages[index] = Stage::new(name, func);
        Ok(())
    }

    pub fn remove(&self, kind: OperationKind, name: &str) -> Result<()> {
        let mut state = self.state.write()?;
        let stages = state.stages_mut(kind);
        let index = position(stages, kind, name)?;

        info!(%kind, name, "removing callback");
        stages.remove(index);
        Ok(())
    }

    /// Snapshot the stages registered for `kind`. Repeated calls without an
    /// intervening mutation return the same cached chain.
    pub fn compile(&self, kind: OperationKind) -> Result<Chain> {
        if let Some(chain) = self.state.read()?.compiled.get(&kind) {
            return Ok(chain.clone());
        }

        let mut state = self.state.write()?;
        if let Some(chain) = state.compiled.get(&kind) {
            return Ok(chain.clone());
        }

        let stages = state.processors.get(&kind).cloned().unwrap_or_default();
        let chain = Chain::new(kind, stages);
        debug!(%kind, stages = chain.len(), "compiled callback chain");
        state.compiled.insert(kind, chain.clone());
        Ok(chain)
    }

    pub fn names(&self, kind: OperationKind) -> Result<Vec<String>> {
        let state = self.state.read()?;
        Ok(state
            .processors
            .get(&kind)
            .map(|stages| stages.iter().map(|s| s.name().to_string()).collect())
            .unwrap_or_default())
    }

    pub fn create(&self) -> Processor<'_> {
        self.processor(OperationKind::Create)
    }

    pub fn update(&self) -> Processor<'_> {
        self.processor(OperationKind::Update)
    }

    pub fn delete(&self) -> Processor<'_> {
        self.processor(OperationKind::Delete)
    }

    pub fn query(&self) -> Processor<'_> {
        self.processor(OperationKind::Query)
    }

    pub fn row_query(&self) -> Processor<'_> {
        self.processor(OperationKind::RowQuery)
    }

    pub fn processor(&self, kind: OperationKind) -> Processor<'_> {
        Processor {
            callback: self,
            kind,
        }
    }
}

fn ensure_unique(stages: &[Stage], kind: OperationKind, name: &str) -> Result<()> {
    if stages.iter().any(|s| s.name() == name) {
        return Err(DbError::DuplicateCallback(name.to_string(), kind));
    }
    Ok(())
}

fn position(stages: &[Stage], kind: OperationKind, name: &str) -> Result<usize> {
    stages
        .iter()
        .position(|s| s.name() == name)
        .ok_or_else(|| DbError::CallbackNotFound(name.to_string(), kind))
}

/// Registry view bound to one operation kind:
/// `callback.update().after("rowhook:update").register(...)`.
#[derive(Clone, Copy)]
pub struct Processor<'a> {
    callback: &'a Callback,
    kind: OperationKind,
}

impl<'a> Processor<'a> {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn register<F>(self, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        self.callback.register(self.kind, name, func)
    }

    pub fn before(self, anchor: &'a str) -> Placement<'a> {
        Placement {
            processor: self,
            anchor,
            after: false,
        }
    }

    pub fn after(self, anchor: &'a str) -> Placement<'a> {
        Placement {
            processor: self,
            anchor,
            after: true,
        }
    }

    pub fn replace<F>(self, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        self.callback.replace(self.kind, name, func)
    }

    pub fn remove(self, name: &str) -> Result<()> {
        self.callback.remove(self.kind, name)
    }

    pub fn compile(self) -> Result<Chain> {
        self.callback.compile(self.kind)
    }

    pub fn names(self) -> Result<Vec<String>> {
        self.callback.names(self.kind)
    }
}

/// Pending positional registration relative to an anchor stage.
pub struct Placement<'a> {
    processor: Processor<'a>,
    anchor: &'a str,
    after: bool,
}

impl Placement<'_> {
    pub fn register<F>(self, name: &str, func: F) -> Result<()>
    where
        F: Fn(&mut Scope<'_>) + Send + Sync + 'static,
    {
        let Processor { callback, kind } = self.processor;
        if self.after {
            callback.insert_after(kind, self.anchor, name, func)
        } else {
            callback.insert_before(kind, self.anchor, name, func)
        }
    }
}
