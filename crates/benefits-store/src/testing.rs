use crate::{ScopedEntity, Value};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub unit_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(owner: &str, unit: Option<&str>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: Some(owner.to_string()),
            unit_id: unit.map(str::to_string),
            status: "open".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }
}

#[derive(Debug, Default)]
pub struct RecordPatch {
    pub status: Option<String>,
    pub owner_id: Option<String>,
    pub unit_id: Option<String>,
}

impl RecordPatch {
    pub fn status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::default()
        }
    }
}

impl ScopedEntity for Record {
    type Patch = RecordPatch;

    const ENTITY: &'static str = "record";
    const TABLE: &'static str = "records";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn set_owner_id(&mut self, owner_id: Option<String>) {
        self.owner_id = owner_id;
    }

    fn unit_id(&self) -> Option<&str> {
        self.unit_id.as_deref()
    }

    fn set_unit_id(&mut self, unit_id: Option<String>) {
        self.unit_id = unit_id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "status" => Some(Value::from(self.status.as_str())),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: RecordPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.owner_id.is_some() {
            self.owner_id = patch.owner_id;
        }
        if patch.unit_id.is_some() {
            self.unit_id = patch.unit_id;
        }
    }
}
