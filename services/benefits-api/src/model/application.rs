use benefits_store::{ScopedEntity, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    InReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// A member's application for a benefit.
///
/// `owner_id` and `unit_id` are stamped by the scoped repository from the
/// caller's scope context; values sent by clients are not trusted.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct BenefitApplication {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub unit_id: Option<String>,
    pub benefit_type: String,
    pub status: ApplicationStatus,
    pub amount_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BenefitApplication {
    pub fn new(benefit_type: impl Into<String>, amount_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id: None,
            unit_id: None,
            benefit_type: benefit_type.into(),
            status: ApplicationStatus::Submitted,
            amount_cents,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct ApplicationPatchRequest {
    pub benefit_type: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub amount_cents: Option<i64>,
    pub notes: Option<String>,
}

impl ScopedEntity for BenefitApplication {
    type Patch = ApplicationPatchRequest;

    const ENTITY: &'static str = "benefit application";
    const TABLE: &'static str = "benefit_applications";

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
            "benefit_type" => Some(Value::from(self.benefit_type.as_str())),
            "status" => Some(Value::from(self.status.as_str())),
            "amount_cents" => Some(Value::Int(self.amount_cents)),
            "notes" => Some(self.notes.as_deref().map_or(Value::Null, Value::from)),
            _ => None,
        }
    }

    fn apply_patch(&mut self, patch: ApplicationPatchRequest) {
        if let Some(benefit_type) = patch.benefit_type {
            self.benefit_type = benefit_type;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(amount_cents) = patch.amount_cents {
            self.amount_cents = amount_cents;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
    }
}
