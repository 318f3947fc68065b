//! Acting user and role-based preconditions.
//!
//! Authentication happens upstream; by the time a call reaches the core the
//! caller is represented by an [`Actor`]. The core only checks that the
//! actor's role grants the permission an operation needs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FloorError, FloorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    /// Plans production: creates orders
    InternalOperator,
    /// Runs the floor: starts and finishes work orders
    ExternalOperator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::InternalOperator => write!(f, "internal_operator"),
            Self::ExternalOperator => write!(f, "external_operator"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "internal_operator" => Ok(Self::InternalOperator),
            "external_operator" => Ok(Self::ExternalOperator),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateOrders,
    OperateWorkOrders,
    ManageMachines,
    ManageMaintenance,
    ManageLots,
    EditDrafts,
}

impl Permission {
    /// Roles granted this permission
    pub fn granted_to(&self, role: Role) -> bool {
        use Permission::*;
        use Role::*;

        match (self, role) {
            (_, Admin) => true,
            (CreateOrders, InternalOperator) => true,
            (OperateWorkOrders, ExternalOperator) => true,
            (ManageMachines, _) => false,
            (ManageMaintenance | ManageLots | EditDrafts, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateOrders => write!(f, "create orders"),
            Self::OperateWorkOrders => write!(f, "operate work orders"),
            Self::ManageMachines => write!(f, "manage machines"),
            Self::ManageMaintenance => write!(f, "manage maintenance"),
            Self::ManageLots => write!(f, "manage bobbin lots"),
            Self::EditDrafts => write!(f, "edit drafts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn can(&self, permission: Permission) -> bool {
        permission.granted_to(self.role)
    }

    pub fn require(&self, permission: Permission) -> FloorResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(FloorError::Forbidden {
                actor: self.username.clone(),
                role: self.role,
                permission,
            })
        }
    }
}
