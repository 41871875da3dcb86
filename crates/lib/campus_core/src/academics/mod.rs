//! Academic record rules.
//!
//! Class codes, matricules, academic years, exam session codes, grade bounds,
//! and the weighted UE average. Storage lives in [`queries`].

pub mod queries;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::academics::{
    ClassUpdate, Filiere, NewClassGroup, NewExamSession, NewGrade, Niveau, SessionType,
};

/// Longest accepted class code.
pub const MAX_CLASS_CODE_LEN: usize = 15;
/// Grades are out of 20.
pub const MAX_GRADE: f64 = 20.0;

static ACADEMIC_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{4}$").expect("valid academic year regex"));

static MATRICULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{8}$").expect("valid matricule regex"));

/// Academic record errors.
#[derive(Debug, Error)]
pub enum AcademicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

/// Default class code: level, year, track (`M` + `1` + `MAGA` → `M1MAGA`).
pub fn class_code(niveau: Niveau, annee: i16, filiere: Filiere) -> String {
    format!("{niveau}{annee}{filiere}")
}

/// `AAAA-AAAA`, e.g. `2024-2025`.
pub fn is_academic_year(value: &str) -> bool {
    ACADEMIC_YEAR.is_match(value)
}

/// Eight upper-case letters or digits.
pub fn is_matricule(value: &str) -> bool {
    MATRICULE.is_match(value)
}

/// Exam session code: first four characters of the academic year, then
/// `-S` and the session kind (`2024-2025` + resit → `2024-SR`).
pub fn session_code(annee_universitaire: &str, kind: SessionType) -> String {
    let year: String = annee_universitaire.chars().take(4).collect();
    format!("{year}-S{kind}")
}

fn check_annee(annee: i16) -> Result<(), AcademicError> {
    if !(1..=5).contains(&annee) {
        return Err(AcademicError::Validation(format!(
            "annee must be between 1 and 5, got {annee}"
        )));
    }
    Ok(())
}

pub(crate) fn check_class_code(code: &str) -> Result<(), AcademicError> {
    if code.is_empty() {
        return Err(AcademicError::Validation("code_classe must not be empty".into()));
    }
    if code.chars().count() > MAX_CLASS_CODE_LEN {
        return Err(AcademicError::Validation(format!(
            "code_classe must be at most {MAX_CLASS_CODE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a new class and resolve its code.
pub fn resolve_new_class(class: &NewClassGroup) -> Result<String, AcademicError> {
    check_annee(class.annee)?;
    let code = match class.code_classe.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => class_code(class.niveau, class.annee, class.filiere),
    };
    check_class_code(&code)?;
    Ok(code)
}

/// Validate the fields a class update sets.
pub fn validate_class_update(update: &ClassUpdate) -> Result<(), AcademicError> {
    if let Some(annee) = update.annee {
        check_annee(annee)?;
    }
    if let Some(code) = &update.code_classe {
        check_class_code(code.trim())?;
    }
    Ok(())
}

/// Reject matricules outside `[A-Z0-9]{8}`.
pub fn validate_matricule(matricule: &str) -> Result<(), AcademicError> {
    if !is_matricule(matricule) {
        return Err(AcademicError::Validation(format!(
            "matricule '{matricule}' must be 8 upper-case letters or digits"
        )));
    }
    Ok(())
}

/// Reject grades outside `[0, 20]`.
pub fn validate_grade_value(valeur: f64) -> Result<(), AcademicError> {
    if !(0.0..=MAX_GRADE).contains(&valeur) {
        return Err(AcademicError::Validation(format!(
            "valeur must be between 0 and {MAX_GRADE}, got {valeur}"
        )));
    }
    Ok(())
}

/// Validate a new grade.
pub fn validate_new_grade(grade: &NewGrade) -> Result<(), AcademicError> {
    validate_grade_value(grade.valeur)
}

/// Validate a new exam session and derive its code.
pub fn resolve_new_session(session: &NewExamSession) -> Result<String, AcademicError> {
    if !is_academic_year(&session.annee_universitaire) {
        return Err(AcademicError::Validation(format!(
            "annee_universitaire '{}' must be YYYY-YYYY",
            session.annee_universitaire
        )));
    }
    if session.date_fin < session.date_debut {
        return Err(AcademicError::Validation(
            "date_fin must not precede date_debut".into(),
        ));
    }
    Ok(session_code(&session.annee_universitaire, session.type_session))
}

/// Weighted average Σ(value × coefficient) / Σ(coefficient); 0 when there
/// is no weight.
pub fn weighted_average<I>(grades: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (total, weight) = grades
        .into_iter()
        .fold((0.0, 0.0), |(total, weight), (value, coefficient)| {
            (total + value * coefficient, weight + coefficient)
        });
    if weight > 0.0 { total / weight } else { 0.0 }
}
