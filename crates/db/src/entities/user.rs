//! User entity (the account directory).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "collaborator")]
    Collaborator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Bearer access token (issued by the auth service)
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing, default)]
    pub token: Option<String>,

    pub role: Role,

    #[sea_orm(default_value = false)]
    pub is_active: bool,

    /// True once a collaborator request for this account was approved
    #[sea_orm(default_value = false)]
    pub is_approved: bool,

    // Settlement terms, copied from the approved collaborator request
    #[sea_orm(nullable)]
    pub bank_account: Option<String>,

    #[sea_orm(nullable)]
    pub bank_name: Option<String>,

    #[sea_orm(column_type = "Double", default_value = 0.0)]
    pub commission_rate: f64,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    /// Admin who approved the collaborator request
    #[sea_orm(nullable)]
    pub approved_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this account is an approved collaborator.
    #[must_use]
    pub fn is_collaborator(&self) -> bool {
        self.role == Role::Collaborator && self.is_approved
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::collaborator_request::Entity")]
    CollaboratorRequests,

    #[sea_orm(has_many = "super::resource::Entity")]
    Resources,
}

impl Related<super::collaborator_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CollaboratorRequests.def()
    }
}

impl Related<super::resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
