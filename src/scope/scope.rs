use std::time::Instant;

use chrono::{DateTime, Utc};
use log::debug;
use tracing::warn;

use super::{Condition, InstanceData, Search, Settings};
use crate::callback::{Callback, OperationKind};
use crate::core::{DbError, Result, Value, to_db_name};
use crate::dialect::Dialect;
use crate::driver::Connection;
use crate::model::{Association, Field, HookKind, Record, hooks};

pub type NowFn = fn() -> DateTime<Utc>;

/// Everything a scope borrows from its session.
pub struct ScopeEnv<'a> {
    pub conn: &'a mut dyn Connection,
    pub dialect: &'a dyn Dialect,
    pub callbacks: &'a Callback,
    pub now: NowFn,
    pub log_sql: bool,
}

impl ScopeEnv<'_> {
    pub fn reborrow(&mut self) -> ScopeEnv<'_> {
        ScopeEnv {
            conn: &mut *self.conn,
            dialect: self.dialect,
            callbacks: self.callbacks,
            now: self.now,
            log_sql: self.log_sql,
        }
    }
}

/// Per-call context threaded through one callback chain.
///
/// Stages communicate only through the scope: typed settings and instance data,
/// the SQL being built with its bound values, the first error and the
/// skip-remaining flag.
pub struct Scope<'a> {
    record: &'a mut dyn Record,
    env: ScopeEnv<'a>,
    settings: Settings,
    instance: InstanceData,
    search: Search,
    sql: String,
    vars: Vec<Value>,
    error: Option<DbError>,
    skip_left: bool,
    rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl<'a> Scope<'a> {
    pub fn new(
        record: &'a mut dyn Record,
        env: ScopeEnv<'a>,
        settings: Settings,
        instance: InstanceData,
        search: Search,
    ) -> Self {
        Self {
            record,
            env,
            settings,
            instance,
            search,
            sql: String::new(),
            vars: Vec::new(),
            error: None,
            skip_left: false,
            rows_affected: 0,
            last_insert_id: None,
        }
    }

    // ------------------------------------------------------------------
    // Error and flow control
    // ------------------------------------------------------------------

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&DbError> {
        self.error.as_ref()
    }

    /// Record a failure. The first error wins; later ones are only logged.
    pub fn err(&mut self, error: DbError) {
        match &self.error {
            None => self.error = Some(error),
            Some(first) => warn!(%first, dropped = %error, "scope already failed"),
        }
    }

    /// Stop the chain after the current stage without signalling an error.
    pub fn skip_left(&mut self) {
        self.skip_left = true;
    }

    pub fn skipped(&self) -> bool {
        self.skip_left
    }

    // ------------------------------------------------------------------
    // Global and instance data
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.settings.set(key, value);
    }

    pub fn instance(&self) -> &InstanceData {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut InstanceData {
        &mut self.instance
    }

    pub fn instance_get(&self, key: &str) -> Option<&Value> {
        self.instance.get(key)
    }

    pub fn instance_set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.instance.set(key, value);
    }

    pub fn search(&self) -> &Search {
        &self.search
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.env.now)()
    }

    // ------------------------------------------------------------------
    // Record access
    // ------------------------------------------------------------------

    pub fn record(&self) -> &dyn Record {
        &*self.record
    }

    pub fn record_mut(&mut self) -> &mut dyn Record {
        &mut *self.record
    }

    pub fn table_name(&self) -> String {
        self.record.table_name()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.record.fields()
    }

    /// Field called `name`, matched by field name or column name, then by
    /// `name` converted to a column name.
    pub fn field_by_name(&self, name: &str) -> Option<Field> {
        let fields = self.record.fields();
        let column = to_db_name(name);
        fields
            .iter()
            .find(|f| f.matches(name))
            .or_else(|| fields.iter().find(|f| f.db_name == column))
            .cloned()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_by_name(name).is_some()
    }

    pub fn primary_field(&self) -> Option<Field> {
        primary_field(&*self.record)
    }

    /// `true` when the record has no primary key or its key is blank.
    pub fn primary_key_zero(&self) -> bool {
        self.primary_field().is_none_or(|f| f.is_blank())
    }

    pub fn set_column(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        set_record_column(&mut *self.record, name, value.into())
    }

    /// Run a lifecycle hook if the record implements it. A failing hook sets
    /// the scope error.
    pub fn call_method(&mut self, hook: HookKind) {
        if self.has_error() {
            return;
        }

        match hooks::invoke(&mut *self.record, hook) {
            Ok(true) => tracing::trace!(%hook, "hook invoked"),
            Ok(false) => {}
            Err(cause) => self.err(DbError::hook(hook, cause)),
        }
    }

    // ------------------------------------------------------------------
    // SQL building
    // ------------------------------------------------------------------

    pub fn quote(&self, identifier: &str) -> String {
        self.env.dialect.quote(identifier)
    }

    pub fn quoted_table_name(&self) -> String {
        self.quote(&self.table_name())
    }

    /// Bind `value` and return its placeholder. Placeholders are numbered in
    /// the order values are bound.
    pub fn add_to_vars(&mut self, value: impl Into<Value>) -> String {
        self.vars.push(value.into());
        self.env.dialect.bind_var(self.vars.len())
    }

    pub fn raw(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn vars(&self) -> &[Value] {
        &self.vars
    }

    /// `WHERE ...` for the current record: its primary key, soft-delete
    /// scoping and the caller's conditions, AND-ed in that order. Empty when
    /// there is nothing to restrict on.
    pub fn combined_condition_sql(&mut self) -> Result<String> {
        let mut clauses = Vec::new();

        if let Some(pk) = self.primary_field().filter(|f| !f.is_blank()) {
            let column = self.quote(&pk.db_name);
            let placeholder = self.add_to_vars(pk.value);
            clauses.push(format!("{} = {}", column, placeholder));
        }

        if !self.settings.unscoped {
            if let Some(deleted_at) = self.field_by_name("DeletedAt") {
                clauses.push(format!("{} IS NULL", self.quote(&deleted_at.db_name)));
            }
        }

        for condition in self.search.conditions().to_vec() {
            match condition {
                Condition::Eq(column, value) => {
                    let column = self.quote(&column);
                    let placeholder = self.add_to_vars(value);
                    clauses.push(format!("{} = {}", column, placeholder));
                }
                Condition::Raw(sql, values) => {
                    clauses.push(self.bind_raw(&sql, values)?);
                }
            }
        }

        if clauses.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("WHERE {}", clauses.join(" AND ")))
    }

    fn bind_raw(&mut self, sql: &str, values: Vec<Value>) -> Result<String> {
        let markers = bind_markers(sql).filter(|&(_, marker)| marker).count();
        if markers != values.len() {
            return Err(DbError::InvalidCondition(format!(
                "'{}' has {} markers but {} values",
                sql,
                markers,
                values.len()
            )));
        }

        let mut values = values.into_iter();
        let mut out = String::with_capacity(sql.len());
        for (ch, marker) in bind_markers(sql) {
            if marker {
                if let Some(value) = values.next() {
                    out.push_str(&self.add_to_vars(value));
                    continue;
                }
            }
            out.push(ch);
        }
        Ok(format!("({})", out))
    }

    /// Execute the accumulated SQL with the bound values.
    pub fn exec(&mut self) {
        if self.has_error() {
            return;
        }

        let started = Instant::now();
        match self.env.conn.exec(&self.sql, &self.vars) {
            Ok(result) => {
                self.rows_affected = result.rows_affected;
                self.last_insert_id = result.last_insert_id;
                if self.env.log_sql {
                    debug!(
                        "[{:.3}ms] {} {:?} ({} rows)",
                        started.elapsed().as_secs_f64() * 1000.0,
                        self.sql,
                        self.vars,
                        result.rows_affected
                    );
                }
            }
            Err(e) => self.err(e),
        }
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Open a transaction unless one is already running on the connection.
    pub fn begin(&mut self) {
        if self.has_error() || self.env.conn.in_transaction() {
            return;
        }

        match self.env.conn.begin() {
            Ok(()) => self.instance.started_transaction = true,
            Err(e) => self.err(e),
        }
    }

    /// Close the transaction this scope opened: roll back if any stage
    /// failed, commit otherwise.
    pub fn commit_or_rollback(&mut self) {
        if !self.instance.started_transaction {
            return;
        }
        self.instance.started_transaction = false;

        if self.has_error() {
            if let Err(e) = self.env.conn.rollback() {
                warn!(error = %e, "rollback failed");
            }
        } else if let Err(e) = self.env.conn.commit() {
            self.err(e);
        }
    }

    // ------------------------------------------------------------------
    // Associations
    // ------------------------------------------------------------------

    /// Borrow the record's related records together with a saver that runs
    /// nested chains on this scope's connection.
    pub fn split_associations(&mut self) -> (Vec<Association<'_>>, AssociationSaver<'_>) {
        let saver = AssociationSaver {
            env: self.env.reborrow(),
            save_associations: self.settings.save_associations,
        };
        (self.record.associations(), saver)
    }

    /// Close anything the chain left open and surface the outcome.
    pub fn finish(mut self) -> Result<u64> {
        if self.instance.started_transaction {
            self.commit_or_rollback();
        }

        match self.error {
            Some(e) => Err(e),
            None => Ok(self.rows_affected),
        }
    }
}

/// Saves related records through the registry's create/update chains.
pub struct AssociationSaver<'a> {
    env: ScopeEnv<'a>,
    save_associations: bool,
}

impl AssociationSaver<'_> {
    /// Create when the record's primary key is blank, full update otherwise.
    pub fn save(&mut self, record: &mut dyn Record) -> Result<u64> {
        let kind = if primary_field(&*record).is_none_or(|f| f.is_blank()) {
            OperationKind::Create
        } else {
            OperationKind::Update
        };

        let settings = Settings {
            save_associations: self.save_associations,
            ..Settings::default()
        };
        run_operation(
            kind,
            record,
            self.env.reborrow(),
            settings,
            InstanceData::default(),
            Search::default(),
        )
    }
}

/// Compile the chain for `kind` and run it against a fresh scope.
pub fn run_operation(
    kind: OperationKind,
    record: &mut dyn Record,
    mut env: ScopeEnv<'_>,
    settings: Settings,
    instance: InstanceData,
    search: Search,
) -> Result<u64> {
    let chain = env.callbacks.compile(kind)?;
    let mut scope = Scope::new(&mut *record, env.reborrow(), settings, instance, search);
    chain.run(&mut scope);
    scope.finish()
}

pub fn primary_field(record: &dyn Record) -> Option<Field> {
    record.fields().into_iter().find(|f| f.is_primary_key)
}

/// Assign a field on any record, resolving Rust or column names.
pub fn set_record_column(record: &mut dyn Record, name: &str, value: Value) -> Result<()> {
    let field = record
        .fields()
        .into_iter()
        .find(|f| f.matches(name))
        .ok_or_else(|| DbError::FieldNotFound(name.to_string(), record.table_name()))?;
    record.set_field(&field.name, value)
}

/// Each character of `sql` paired with whether it is a bind marker. A `?`
/// inside a single-quoted literal is text.
fn bind_markers(sql: &str) -> impl Iterator<Item = (char, bool)> + '_ {
    let mut quoted = false;
    sql.chars().map(move |ch| {
        if ch == '\'' {
            quoted = !quoted;
        }
        (ch, ch == '?' && !quoted)
    })
}
