#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rowhook::model::{
    AfterCreate, AfterDelete, AfterSave, AfterUpdate, BeforeCreate, BeforeDelete, BeforeSave,
    BeforeUpdate,
};
use rowhook::{
    Association, DbError, Field, HookKind, HookResult, MemoryDriver, Record, Result, Session,
    SessionConfig, Value,
};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn earlier() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

/// Session on a fresh memory driver with the clock pinned to `fixed_now`.
pub fn session() -> (Session, MemoryDriver) {
    let driver = MemoryDriver::new();
    let session = Session::with_config(driver.clone(), SessionConfig::new().now(fixed_now));
    (session, driver)
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("{0} rejected")]
pub struct HookRejected(pub HookKind);

#[derive(Debug, Default)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

impl Record for Company {
    fn table_name(&self) -> String {
        "companies".into()
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("ID", self.id).primary_key(),
            Field::new("Name", self.name.as_str()),
        ]
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "ID" => self.id = value.as_i64().unwrap_or_default(),
            "Name" => self.name = text(&value),
            other => return Err(DbError::FieldNotFound(other.into(), self.table_name())),
        }
        Ok(())
    }
}

/// Soft-deletable child of `User`.
#[derive(Debug, Default)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Record for Post {
    fn table_name(&self) -> String {
        "posts".into()
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("ID", self.id).primary_key(),
            Field::new("UserID", self.user_id),
            Field::new("Title", self.title.as_str()),
            Field::new("DeletedAt", self.deleted_at),
        ]
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "ID" => self.id = value.as_i64().unwrap_or_default(),
            "UserID" => self.user_id = value.as_i64().unwrap_or_default(),
            "Title" => self.title = text(&value),
            "DeletedAt" => self.deleted_at = value.as_timestamp(),
            other => return Err(DbError::FieldNotFound(other.into(), self.table_name())),
        }
        Ok(())
    }
}

/// Record with every hook, a protected and an ignored column, and both kinds
/// of association.
#[derive(Debug, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub age: i64,
    pub token: String,
    pub company_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    pub company: Option<Company>,
    pub posts: Vec<Post>,

    pub hooks: Vec<HookKind>,
    pub fail_hook: Option<HookKind>,
}

impl User {
    /// Persisted user: id 1, name "x", role "admin", age 20.
    pub fn persisted() -> Self {
        Self {
            id: 1,
            name: "x".into(),
            role: "admin".into(),
            age: 20,
            created_at: Some(earlier()),
            updated_at: Some(earlier()),
            ..Self::default()
        }
    }

    fn on_hook(&mut self, hook: HookKind) -> HookResult {
        self.hooks.push(hook);
        if self.fail_hook == Some(hook) {
            return Err(HookRejected(hook).into());
        }
        Ok(())
    }
}

impl Record for User {
    fn table_name(&self) -> String {
        "users".into()
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("ID", self.id).primary_key(),
            Field::new("Name", self.name.as_str()),
            Field::new("Role", self.role.as_str()).protected(),
            Field::new("Age", self.age),
            Field::new("Token", self.token.as_str()).ignored(),
            Field::new("CompanyID", self.company_id),
            Field::new("CreatedAt", self.created_at),
            Field::new("UpdatedAt", self.updated_at),
        ]
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "ID" => self.id = value.as_i64().unwrap_or_default(),
            "Name" => self.name = text(&value),
            "Role" => self.role = text(&value),
            "Age" => self.age = value.as_i64().unwrap_or_default(),
            "Token" => self.token = text(&value),
            "CompanyID" => self.company_id = value.as_i64().unwrap_or_default(),
            "CreatedAt" => self.created_at = value.as_timestamp(),
            "UpdatedAt" => self.updated_at = value.as_timestamp(),
            other => return Err(DbError::FieldNotFound(other.into(), self.table_name())),
        }
        Ok(())
    }

    fn associations(&mut self) -> Vec<Association<'_>> {
        vec![
            Association::belongs_to(
                "Company",
                "CompanyID",
                self.company.as_mut().map(|c| c as &mut dyn Record),
            ),
            Association::has_many(
                "Posts",
                "UserID",
                self.posts.iter_mut().map(|p| p as &mut dyn Record),
            ),
        ]
    }

    fn as_before_save(&mut self) -> Option<&mut dyn BeforeSave> {
        Some(self)
    }

    fn as_before_create(&mut self) -> Option<&mut dyn BeforeCreate> {
        Some(self)
    }

    fn as_before_update(&mut self) -> Option<&mut dyn BeforeUpdate> {
        Some(self)
    }

    fn as_before_delete(&mut self) -> Option<&mut dyn BeforeDelete> {
        Some(self)
    }

    fn as_after_create(&mut self) -> Option<&mut dyn AfterCreate> {
        Some(self)
    }

    fn as_after_update(&mut self) -> Option<&mut dyn AfterUpdate> {
        Some(self)
    }

    fn as_after_delete(&mut self) -> Option<&mut dyn AfterDelete> {
        Some(self)
    }

    fn as_after_save(&mut self) -> Option<&mut dyn AfterSave> {
        Some(self)
    }
}

impl BeforeSave for User {
    fn before_save(&mut self) -> HookResult {
        self.on_hook(HookKind::BeforeSave)
    }
}

impl BeforeCreate for User {
    fn before_create(&mut self) -> HookResult {
        self.on_hook(HookKind::BeforeCreate)
    }
}

impl BeforeUpdate for User {
    fn before_update(&mut self) -> HookResult {
        self.on_hook(HookKind::BeforeUpdate)
    }
}

impl BeforeDelete for User {
    fn before_delete(&mut self) -> HookResult {
        self.on_hook(HookKind::BeforeDelete)
    }
}

impl AfterCreate for User {
    fn after_create(&mut self) -> HookResult {
        self.on_hook(HookKind::AfterCreate)
    }
}

impl AfterUpdate for User {
    fn after_update(&mut self) -> HookResult {
        self.on_hook(HookKind::AfterUpdate)
    }
}

impl AfterDelete for User {
    fn after_delete(&mut self) -> HookResult {
        self.on_hook(HookKind::AfterDelete)
    }
}

impl AfterSave for User {
    fn after_save(&mut self) -> HookResult {
        self.on_hook(HookKind::AfterSave)
    }
}
