//! Academic record models.
//!
//! Types matching the `classes`, `students`, `enrollments`, `exam_sessions`
//! and `grades` tables, plus the enumerations that constrain them. Update
//! bodies are partial: `None` leaves a column untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! db_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Database text representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Parse the database text representation.
            pub fn from_db(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

db_enum!(
    /// Degree track.
    Filiere {
        Maga => "MAGA",
        Tdsi => "TDSI",
        Ms2e => "MS2E",
    }
);

db_enum!(
    /// Degree level: Licence or Master.
    Niveau {
        Licence => "L",
        Master => "M",
    }
);

db_enum!(
    /// Track orientation.
    ParcoursOption {
        Professionnel => "PROFESSIONNEL",
        Recherche => "RECHERCHE",
    }
);

db_enum!(
    /// Exam session kind: normal or resit.
    SessionType {
        Normale => "N",
        Rattrapage => "R",
    }
);

/// A class: one year of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id_classe: i64,
    pub code_classe: String,
    pub filiere: Filiere,
    pub niveau: Niveau,
    pub option: ParcoursOption,
    pub annee: i16,
}

/// Request body for creating a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClassGroup {
    #[serde(default)]
    pub code_classe: Option<String>,
    pub filiere: Filiere,
    pub niveau: Niveau,
    pub option: ParcoursOption,
    pub annee: i16,
}

/// Partial class update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassUpdate {
    #[serde(default)]
    pub code_classe: Option<String>,
    #[serde(default)]
    pub filiere: Option<Filiere>,
    #[serde(default)]
    pub niveau: Option<Niveau>,
    #[serde(default)]
    pub option: Option<ParcoursOption>,
    #[serde(default)]
    pub annee: Option<i16>,
}

/// A student profile, optionally linked to a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id_etudiant: i64,
    pub utilisateur: Option<i64>,
    pub matricule: String,
}

/// Request body for creating a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStudent {
    #[serde(default)]
    pub utilisateur: Option<i64>,
    pub matricule: String,
}

/// Partial student update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentUpdate {
    #[serde(default)]
    pub utilisateur: Option<i64>,
    #[serde(default)]
    pub matricule: Option<String>,
}

/// A student's enrollment in a class for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id_inscription: i64,
    pub etudiant: i64,
    pub classe: i64,
    pub annee_academique: String,
    pub date_inscription: DateTime<Utc>,
}

/// Request body for enrolling a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEnrollment {
    pub etudiant: i64,
    pub classe: i64,
    pub annee_academique: String,
}

/// An exam session. `code_session` is derived from year and kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSession {
    pub id_session: i64,
    pub code_session: String,
    pub type_session: SessionType,
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
    pub annee_universitaire: String,
}

/// Request body for creating an exam session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewExamSession {
    pub type_session: SessionType,
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
    pub annee_universitaire: String,
}

/// A stored grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Grade {
    pub id_note: i64,
    pub etudiant: i64,
    pub ec: i64,
    pub session: i64,
    pub valeur: f64,
    pub date_validation: DateTime<Utc>,
}

/// Request body for recording a grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewGrade {
    pub etudiant: i64,
    pub ec: i64,
    pub session: i64,
    pub valeur: f64,
}

/// Partial grade update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeUpdate {
    #[serde(default)]
    pub etudiant: Option<i64>,
    #[serde(default)]
    pub ec: Option<i64>,
    #[serde(default)]
    pub session: Option<i64>,
    #[serde(default)]
    pub valeur: Option<f64>,
}

/// A student enrolled in a class, with the linked account's details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnrolledStudent {
    pub id_etudiant: i64,
    pub matricule: String,
    pub utilisateur: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// A grade with its course element, teaching unit and session context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub id_note: i64,
    pub etudiant: i64,
    pub ec: i64,
    pub code_ec: String,
    pub coefficient: f64,
    pub ue: i64,
    pub code_ue: String,
    pub session: i64,
    pub code_session: String,
    pub valeur: f64,
    pub date_validation: DateTime<Utc>,
    /// Weighted average of the student over the grade's teaching unit.
    pub moyenne_ue: f64,
}
