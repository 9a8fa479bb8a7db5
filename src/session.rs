use std::mem;
use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::callback::{Callback, OperationKind};
use crate::callbacks::DEFAULT_CALLBACK;
use crate::config::SessionConfig;
use crate::core::{Result, Value};
use crate::dialect::Dialect;
use crate::driver::Connection;
use crate::model::{Record, UpdateAttrs};
use crate::scope::{Condition, InstanceData, Search, ScopeEnv, Settings, primary_field, run_operation};

/// Entry point for persisting records.
///
/// A session owns one connection and runs every call through the registry's
/// compiled chains. Per-call modifiers (`unscoped`, `where_eq`, ...) apply to
/// the next call only.
///
/// ```
/// use rowhook::{MemoryDriver, Session, UpdateAttrs};
/// # use rowhook::{Field, Record, Result, Value};
/// # struct User { id: i64, name: String }
/// # impl Record for User {
/// #     fn table_name(&self) -> String { "users".into() }
/// #     fn fields(&self) -> Vec<Field> {
/// #         vec![Field::new("ID", self.id).primary_key(), Field::new("Name", self.name.as_str())]
/// #     }
/// #     fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
/// #         if name == "Name" { self.name = value.as_str().unwrap_or_default().to_string(); }
/// #         Ok(())
/// #     }
/// # }
///
/// let driver = MemoryDriver::new();
/// let mut session = Session::new(driver.clone());
/// let mut user = User { id: 1, name: "x".into() };
///
/// session.updates(&mut user, UpdateAttrs::new().set("Name", "y")).unwrap();
/// assert_eq!(user.name, "y");
/// assert_eq!(
///     driver.last_sql().unwrap(),
///     r#"UPDATE "users" SET "name" = ? WHERE "id" = ?"#
/// );
/// ```
pub struct Session {
    conn: Box<dyn Connection>,
    dialect: Arc<dyn Dialect>,
    callbacks: Arc<Callback>,
    config: SessionConfig,
    pending: Settings,
    search: Search,
}

impl Session {
    pub fn new(conn: impl Connection + 'static) -> Self {
        Self::with_config(conn, SessionConfig::default())
    }

    pub fn with_config(conn: impl Connection + 'static, config: SessionConfig) -> Self {
        Self {
            conn: Box::new(conn),
            dialect: config.dialect.dialect(),
            callbacks: Arc::clone(&DEFAULT_CALLBACK),
            pending: base_settings(&config),
            config,
            search: Search::new(),
        }
    }

    /// Run calls through `callbacks` instead of the process-wide registry.
    pub fn with_callbacks(mut self, callbacks: Arc<Callback>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn callbacks(&self) -> &Arc<Callback> {
        &self.callbacks
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    // ------------------------------------------------------------------
    // Per-call modifiers
    // ------------------------------------------------------------------

    /// Let the next call mass-assign protected fields.
    pub fn ignore_protected_attrs(&mut self) -> &mut Self {
        self.pending.ignore_protected_attrs = true;
        self
    }

    /// Drop soft-delete scoping for the next call.
    pub fn unscoped(&mut self) -> &mut Self {
        self.pending.unscoped = true;
        self
    }

    pub fn without_associations(&mut self) -> &mut Self {
        self.pending.save_associations = false;
        self
    }

    /// Operation-global value visible to custom stages through `Scope::get`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.pending.set(key, value);
        self
    }

    pub fn filter(&mut self, condition: Condition) -> &mut Self {
        self.search.push(condition);
        self
    }

    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter(Condition::Eq(column.into(), value.into()))
    }

    pub fn where_raw(&mut self, sql: impl Into<String>, values: Vec<Value>) -> &mut Self {
        self.filter(Condition::Raw(sql.into(), values))
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Update one attribute, running hooks and timestamping.
    pub fn update(&mut self, record: &mut dyn Record, column: &str, value: impl Into<Value>) -> Result<u64> {
        self.updates(record, UpdateAttrs::new().set(column, value))
    }

    /// Update the changed, assignable subset of `attrs`. An empty map writes
    /// the whole record.
    pub fn updates(&mut self, record: &mut dyn Record, attrs: impl Into<UpdateAttrs>) -> Result<u64> {
        let settings = self.take_settings();
        let instance = InstanceData::with_update_interface(attrs.into());
        self.run(OperationKind::Update, record, settings, instance)
    }

    /// Write one column verbatim: no hooks, no timestamp, no protection.
    pub fn update_column(&mut self, record: &mut dyn Record, column: &str, value: impl Into<Value>) -> Result<u64> {
        self.update_columns(record, UpdateAttrs::new().set(column, value))
    }

    pub fn update_columns(&mut self, record: &mut dyn Record, attrs: impl Into<UpdateAttrs>) -> Result<u64> {
        let mut settings = self.take_settings();
        settings.update_column = true;
        let instance = InstanceData::with_update_interface(attrs.into());
        self.run(OperationKind::Update, record, settings, instance)
    }

    pub fn create(&mut self, record: &mut dyn Record) -> Result<u64> {
        let settings = self.take_settings();
        self.run(OperationKind::Create, record, settings, InstanceData::default())
    }

    /// Create when the primary key is blank, otherwise write every field.
    pub fn save(&mut self, record: &mut dyn Record) -> Result<u64> {
        let settings = self.take_settings();
        let kind = if primary_field(&*record).is_none_or(|f| f.is_blank()) {
            OperationKind::Create
        } else {
            OperationKind::Update
        };
        self.run(kind, record, settings, InstanceData::default())
    }

    /// Soft delete when the record has `DeletedAt`, unless `unscoped`.
    pub fn delete(&mut self, record: &mut dyn Record) -> Result<u64> {
        let settings = self.take_settings();
        self.run(OperationKind::Delete, record, settings, InstanceData::default())
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Open a transaction that spans several calls. Chains run inside it
    /// reuse it instead of opening their own.
    pub fn begin(&mut self) -> Result<()> {
        self.conn.begin()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.conn.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.conn.rollback()
    }

    pub fn in_transaction(&self) -> bool {
        self.conn.in_transaction()
    }

    /// Run `f` in one transaction: commit on `Ok`, roll back on `Err`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.rollback() {
                    warn!(error = %rollback, "rollback after failed transaction failed");
                }
                Err(e)
            }
        }
    }

    fn take_settings(&mut self) -> Settings {
        mem::replace(&mut self.pending, base_settings(&self.config))
    }

    fn run(
        &mut self,
        kind: OperationKind,
        record: &mut dyn Record,
        settings: Settings,
        instance: InstanceData,
    ) -> Result<u64> {
        let search = mem::take(&mut self.search);
        let _span = debug_span!("operation", database = %self.config.database, %kind).entered();
        debug!(table = %record.table_name(), "running operation");

        let env = ScopeEnv {
            conn: &mut *self.conn,
            dialect: &*self.dialect,
            callbacks: &*self.callbacks,
            now: self.config.now,
            log_sql: self.config.log_sql,
        };
        run_operation(kind, record, env, settings, instance, search)
    }
}

fn base_settings(config: &SessionConfig) -> Settings {
    Settings {
        ignore_protected_attrs: config.ignore_protected_attrs,
        save_associations: config.save_associations,
        ..Settings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;

    #[test]
    fn test_base_settings_follow_config() {
        let config = SessionConfig::new()
            .ignore_protected_attrs(true)
            .save_associations(false);

        let settings = base_settings(&config);
        assert!(settings.ignore_protected_attrs);
        assert!(!settings.save_associations);
        assert!(!settings.update_column);
        assert!(!settings.unscoped);
        assert_eq!(settings.get("anything"), None);
    }

    #[test]
    fn test_pending_modifiers_reset_to_config() {
        let config = SessionConfig::new().database("shop").save_associations(false);
        let mut session = Session::with_config(MemoryDriver::new(), config);

        session.unscoped().ignore_protected_attrs().set("audit", "on");
        let taken = session.take_settings();
        assert!(taken.unscoped);
        assert!(taken.ignore_protected_attrs);
        assert_eq!(taken.get("audit"), Some(&Value::from("on")));

        let fresh = session.take_settings();
        assert!(!fresh.unscoped);
        assert!(!fresh.ignore_protected_attrs);
        assert!(!fresh.save_associations);
        assert_eq!(fresh.get("audit"), None);
        assert_eq!(session.config().database, "shop");
    }
}
