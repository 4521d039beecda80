//! Closed enumerations persisted as PostgreSQL enum types.
//!
//! The variant lists below are the only source of the labels written into
//! `CREATE TYPE ... AS ENUM` statements, so the Rust values and the database
//! types cannot drift apart.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a label is not a member of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{label}' is not a valid {type_name} label")]
pub struct UnknownEnumLabel {
    /// PostgreSQL type name of the enumeration.
    pub type_name: &'static str,
    /// The rejected label.
    pub label: String,
}

/// A Rust enumeration mirrored by a PostgreSQL enum type.
pub trait PersistedEnum: Copy + Sized + 'static {
    /// Name of the PostgreSQL type.
    const SQL_TYPE: &'static str;
    /// Every variant, in declaration (and enum sort) order.
    const ALL: &'static [Self];

    /// Label stored in the database for this variant.
    fn as_str(self) -> &'static str;

    /// Every label, in enum sort order.
    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|variant| variant.as_str()).collect()
    }

    /// Parse a stored label back into a variant.
    fn parse_label(label: &str) -> Result<Self, UnknownEnumLabel> {
        Self::ALL
            .iter()
            .copied()
            .find(|variant| variant.as_str() == label)
            .ok_or_else(|| UnknownEnumLabel {
                type_name: Self::SQL_TYPE,
                label: label.to_owned(),
            })
    }
}

/// Account role stored in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Candidate,
    Recruiter,
}

impl PersistedEnum for UserRole {
    const SQL_TYPE: &'static str = "userrole";
    const ALL: &'static [Self] = &[Self::Candidate, Self::Recruiter];

    fn as_str(self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Recruiter => "recruiter",
        }
    }
}

/// Lifecycle state stored in `tests.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Preparing,
    Draft,
    Scheduled,
    Live,
    Ended,
}

impl TestStatus {
    /// Status the application assigns when none is supplied.
    pub const APPLICATION_DEFAULT: Self = Self::Draft;
}

impl PersistedEnum for TestStatus {
    const SQL_TYPE: &'static str = "teststatus";
    const ALL: &'static [Self] = &[
        Self::Preparing,
        Self::Draft,
        Self::Scheduled,
        Self::Live,
        Self::Ended,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }
}

macro_rules! impl_label_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = UnknownEnumLabel;

                fn from_str(value: &str) -> Result<Self, Self::Err> {
                    Self::parse_label(value)
                }
            }
        )*
    };
}

impl_label_traits!(UserRole, TestStatus);
