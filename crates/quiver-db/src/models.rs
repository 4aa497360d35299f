use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Status of a routine assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    Paused,
    Finished,
}

impl Default for AssignmentStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

impl FromStr for AssignmentStatus {
    type Err = AssignmentStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "finished" => Ok(Self::Finished),
            other => Err(AssignmentStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`AssignmentStatus`] string.
#[derive(Debug, Clone)]
pub struct AssignmentStatusParseError(pub String);

impl fmt::Display for AssignmentStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid assignment status: {:?}", self.0)
    }
}

impl std::error::Error for AssignmentStatusParseError {}

// ---------------------------------------------------------------------------

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coach,
    Archer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Admin => "admin",
            Self::Coach => "coach",
            Self::Archer => "archer",
        };
        f.write_str(s)
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "coach" => Ok(Self::Coach),
            "archer" => Ok(Self::Archer),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Role`] string.
#[derive(Debug, Clone)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: {:?}", self.0)
    }
}

impl std::error::Error for RoleParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A reusable exercise definition (shooting drill).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub arrows_count: i32,
    pub distance_m: f64,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A club member who receives routine assignments.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub document_number: String,
    pub contact: Option<String>,
    pub bow_pounds: Option<f64>,
    pub arrows_available: Option<i32>,
    pub is_active: bool,
    /// Non-null exactly while the student is inactive; the retention sweep
    /// keys off this timestamp.
    pub inactive_since: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A training plan -- the root of a day/exercise tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Routine {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// TRUE for durable reusable plans; FALSE for ad-hoc plans eligible for
    /// the retention sweep once expired and unassigned.
    pub is_template: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One training day within a routine (day_number 1-7, unique per routine).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutineDay {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub day_number: i32,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An exercise slot within a routine day, with optional per-slot overrides.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutineDayExercise {
    pub id: Uuid,
    pub routine_day_id: Uuid,
    pub exercise_id: Uuid,
    pub sort_order: i32,
    pub arrows_override: Option<i32>,
    pub distance_override_m: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A routine assigned to a student for a (possibly unbounded) date window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub routine_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user account for the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_status_display_roundtrip() {
        let variants = [
            AssignmentStatus::Active,
            AssignmentStatus::Paused,
            AssignmentStatus::Finished,
        ];
        for v in &variants {
            let s = v.to_string();
            let parsed: AssignmentStatus = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn assignment_status_invalid() {
        let result = "archived".parse::<AssignmentStatus>();
        assert!(result.is_err());
    }

    #[test]
    fn assignment_status_default_is_active() {
        assert_eq!(AssignmentStatus::default(), AssignmentStatus::Active);
    }

    #[test]
    fn role_display_roundtrip() {
        let variants = [Role::Admin, Role::Coach, Role::Archer];
        for v in &variants {
            let s = v.to_string();
            let parsed: Role = s.parse().expect("should parse");
            assert_eq!(*v, parsed);
        }
    }

    #[test]
    fn role_invalid() {
        let result = "superuser".parse::<Role>();
        assert!(result.is_err());
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "robin".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            role: Role::Coach,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).expect("should serialize");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "robin");
    }
}
