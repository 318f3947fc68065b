//! # Machine Model
//!
//! A production machine on the floor. Machines are created once at floor
//! initialization and afterwards only toggled active/inactive or recolored.
//!
//! `color` is derived: it always equals the resolver's output for the
//! machine's current live work, except while `active == false`, which forces
//! [`MachineColor::Desativada`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::{Collection, Record};

/// Availability color of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineColor {
    /// Available, nothing queued
    Verde,
    /// Work queued, nothing running
    Amarelo,
    /// Running a work order
    Vermelho,
    /// Under maintenance
    Azul,
    /// Deactivated by an administrator
    Desativada,
}

impl MachineColor {
    /// Only an available machine accepts new direct demand
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Verde)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Vermelho | Self::Azul)
    }
}

impl fmt::Display for MachineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verde => write!(f, "verde"),
            Self::Amarelo => write!(f, "amarelo"),
            Self::Vermelho => write!(f, "vermelho"),
            Self::Azul => write!(f, "azul"),
            Self::Desativada => write!(f, "desativada"),
        }
    }
}

impl std::str::FromStr for MachineColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verde" => Ok(Self::Verde),
            "amarelo" => Ok(Self::Amarelo),
            "vermelho" => Ok(Self::Vermelho),
            "azul" => Ok(Self::Azul),
            "desativada" => Ok(Self::Desativada),
            _ => Err(format!("Invalid machine color: {s}")),
        }
    }
}

impl Default for MachineColor {
    fn default() -> Self {
        Self::Verde
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: Uuid,
    /// Floor label, e.g. `CD1`, `U12`
    pub code: String,
    pub layout_group: String,
    pub active: bool,
    pub color: MachineColor,
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Namespace for machine ids derived from `(layout_group, code)`
const MACHINE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_3c2a_84b7_4e0f_9a55_c1d2_0b7e_41a3);

impl Machine {
    /// A freshly installed machine: active and available
    pub fn new(code: impl Into<String>, layout_group: impl Into<String>, now: DateTime<Utc>) -> Self {
        let code = code.into();
        let layout_group = layout_group.into();
        Self {
            id: Self::derive_id(&layout_group, &code),
            code,
            layout_group,
            active: true,
            color: MachineColor::Verde,
            updated_at: now,
        }
    }

    /// Stable id for a code within a layout group; a second registration of
    /// the same code collides on the document key at commit.
    pub fn derive_id(layout_group: &str, code: &str) -> Uuid {
        Uuid::new_v5(
            &MACHINE_ID_NAMESPACE,
            format!("{layout_group}/{code}").as_bytes(),
        )
    }
}

impl Record for Machine {
    const COLLECTION: Collection = Collection::Machines;

    fn id(&self) -> Uuid {
        self.id
    }
}
