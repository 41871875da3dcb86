//! Academic record queries.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use super::{
    AcademicError, check_class_code, is_academic_year, resolve_new_class, resolve_new_session,
    validate_class_update, validate_grade_value, validate_matricule, validate_new_grade,
    weighted_average,
};
use crate::models::academics::{
    ClassGroup, ClassUpdate, EnrolledStudent, Enrollment, ExamSession, Filiere, Grade,
    GradeRecord, GradeUpdate, NewClassGroup, NewEnrollment, NewExamSession, NewGrade, NewStudent,
    Niveau, ParcoursOption, SessionType, Student, StudentUpdate,
};

/// Row returned by class queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ClassRow {
    id: i64,
    code_classe: String,
    filiere: String,
    niveau: String,
    option: String,
    annee: i16,
}

impl TryFrom<ClassRow> for ClassGroup {
    type Error = AcademicError;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        let invalid = |field: &str, value: &str| {
            AcademicError::InvalidData(format!("class {}: bad {field} '{value}'", row.id))
        };
        Ok(ClassGroup {
            id_classe: row.id,
            filiere: Filiere::from_db(&row.filiere)
                .ok_or_else(|| invalid("filiere", &row.filiere))?,
            niveau: Niveau::from_db(row.niveau.trim())
                .ok_or_else(|| invalid("niveau", &row.niveau))?,
            option: ParcoursOption::from_db(&row.option)
                .ok_or_else(|| invalid("option", &row.option))?,
            code_classe: row.code_classe,
            annee: row.annee,
        })
    }
}

/// Row returned by the grade query.
#[derive(Debug, Clone, sqlx::FromRow)]
struct GradeRow {
    id: i64,
    student_id: i64,
    ec_id: i64,
    code_ec: String,
    coefficient: f64,
    ue_id: i64,
    code_ue: String,
    session_id: i64,
    code_session: String,
    valeur: f64,
    date_validation: DateTime<Utc>,
}

/// Row returned by exam session queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    code_session: String,
    type_session: String,
    date_debut: NaiveDate,
    date_fin: NaiveDate,
    annee_universitaire: String,
}

impl TryFrom<SessionRow> for ExamSession {
    type Error = AcademicError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let type_session = SessionType::from_db(row.type_session.trim()).ok_or_else(|| {
            AcademicError::InvalidData(format!(
                "session {}: bad type_session '{}'",
                row.id, row.type_session
            ))
        })?;
        Ok(ExamSession {
            id_session: row.id,
            code_session: row.code_session,
            type_session,
            date_debut: row.date_debut,
            date_fin: row.date_fin,
            annee_universitaire: row.annee_universitaire,
        })
    }
}

fn map_write_error(e: sqlx::Error, what: &str) -> AcademicError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AcademicError::Conflict(format!("{what} already exists"))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AcademicError::Conflict(format!("{what} references a missing or in-use record"))
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            AcademicError::Validation(format!("{what} violates {}", db.message()))
        }
        _ => AcademicError::DbError(e),
    }
}

/// List classes ordered by code.
pub async fn list_classes(pool: &PgPool) -> Result<Vec<ClassGroup>, AcademicError> {
    let rows = sqlx::query_as::<_, ClassRow>(
        "SELECT id, code_classe, filiere, niveau, option, annee FROM classes ORDER BY code_classe",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ClassGroup::try_from).collect()
}

/// Fetch one class.
pub async fn get_class(pool: &PgPool, id: i64) -> Result<ClassGroup, AcademicError> {
    let row = sqlx::query_as::<_, ClassRow>(
        "SELECT id, code_classe, filiere, niveau, option, annee FROM classes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AcademicError::NotFound(format!("class {id}")))?;
    ClassGroup::try_from(row)
}

/// Create a class, deriving its code when none is given.
pub async fn create_class(
    pool: &PgPool,
    class: &NewClassGroup,
) -> Result<ClassGroup, AcademicError> {
    let code = resolve_new_class(class)?;
    let row = sqlx::query_as::<_, ClassRow>(
        r#"
        INSERT INTO classes (code_classe, filiere, niveau, option, annee)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, code_classe, filiere, niveau, option, annee
        "#,
    )
    .bind(&code)
    .bind(class.filiere.as_str())
    .bind(class.niveau.as_str())
    .bind(class.option.as_str())
    .bind(class.annee)
    .fetch_one(pool)
    .await
    .map_err(|e| map_write_error(e, "class"))?;
    ClassGroup::try_from(row)
}

/// Delete a class. Fails with `Conflict` while enrollments reference it.
pub async fn delete_class(pool: &PgPool, id: i64) -> Result<(), AcademicError> {
    let result = sqlx::query("DELETE FROM classes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "class"))?;
    if result.rows_affected() == 0 {
        return Err(AcademicError::NotFound(format!("class {id}")));
    }
    Ok(())
}

/// Apply a partial update to a class. Unset fields keep their value; the
/// code is not re-derived.
pub async fn update_class(
    pool: &PgPool,
    id: i64,
    update: &ClassUpdate,
) -> Result<ClassGroup, AcademicError> {
    validate_class_update(update)?;

    let mut tx = pool.begin().await?;
    let current = sqlx::query_as::<_, ClassRow>(
        "SELECT id, code_classe, filiere, niveau, option, annee FROM classes WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AcademicError::NotFound(format!("class {id}")))?;
    let current = ClassGroup::try_from(current)?;

    let code = update
        .code_classe
        .as_deref()
        .map(|c| c.trim().to_string())
        .unwrap_or(current.code_classe);
    check_class_code(&code)?;

    let row = sqlx::query_as::<_, ClassRow>(
        r#"
        UPDATE classes
        SET code_classe = $2, filiere = $3, niveau = $4, option = $5, annee = $6
        WHERE id = $1
        RETURNING id, code_classe, filiere, niveau, option, annee
        "#,
    )
    .bind(id)
    .bind(&code)
    .bind(update.filiere.unwrap_or(current.filiere).as_str())
    .bind(update.niveau.unwrap_or(current.niveau).as_str())
    .bind(update.option.unwrap_or(current.option).as_str())
    .bind(update.annee.unwrap_or(current.annee))
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| map_write_error(e, "class"))?;

    tx.commit().await?;
    ClassGroup::try_from(row)
}

const SELECT_STUDENTS: &str =
    "SELECT id AS id_etudiant, user_id AS utilisateur, matricule FROM students";

/// List students ordered by matricule.
pub async fn list_students(pool: &PgPool) -> Result<Vec<Student>, AcademicError> {
    let sql = format!("{SELECT_STUDENTS} ORDER BY matricule");
    Ok(sqlx::query_as::<_, Student>(&sql).fetch_all(pool).await?)
}

/// Fetch one student.
pub async fn get_student(pool: &PgPool, id: i64) -> Result<Student, AcademicError> {
    let sql = format!("{SELECT_STUDENTS} WHERE id = $1");
    sqlx::query_as::<_, Student>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AcademicError::NotFound(format!("student {id}")))
}

/// Create a student profile.
pub async fn create_student(pool: &PgPool, student: &NewStudent) -> Result<Student, AcademicError> {
    validate_matricule(&student.matricule)?;
    let row = sqlx::query_as::<_, Student>(
        r#"
        INSERT INTO students (user_id, matricule)
        VALUES ($1, $2)
        RETURNING id AS id_etudiant, user_id AS utilisateur, matricule
        "#,
    )
    .bind(student.utilisateur)
    .bind(&student.matricule)
    .fetch_one(pool)
    .await
    .map_err(|e| map_write_error(e, "student"))?;
    Ok(row)
}

/// Apply a partial update to a student profile.
pub async fn update_student(
    pool: &PgPool,
    id: i64,
    update: &StudentUpdate,
) -> Result<Student, AcademicError> {
    if let Some(matricule) = &update.matricule {
        validate_matricule(matricule)?;
    }
    sqlx::query_as::<_, Student>(
        r#"
        UPDATE students
        SET user_id = COALESCE($2, user_id), matricule = COALESCE($3, matricule)
        WHERE id = $1
        RETURNING id AS id_etudiant, user_id AS utilisateur, matricule
        "#,
    )
    .bind(id)
    .bind(update.utilisateur)
    .bind(&update.matricule)
    .fetch_optional(pool)
    .await
    .map_err(|e| map_write_error(e, "student"))?
    .ok_or_else(|| AcademicError::NotFound(format!("student {id}")))
}

/// Delete a student and their grades. Fails with `Conflict` while
/// enrollments reference it.
pub async fn delete_student(pool: &PgPool, id: i64) -> Result<(), AcademicError> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "student"))?;
    if result.rows_affected() == 0 {
        return Err(AcademicError::NotFound(format!("student {id}")));
    }
    Ok(())
}

/// Enroll a student in a class for an academic year.
pub async fn create_enrollment(
    pool: &PgPool,
    enrollment: &NewEnrollment,
) -> Result<Enrollment, AcademicError> {
    if !is_academic_year(&enrollment.annee_academique) {
        return Err(AcademicError::Validation(format!(
            "annee_academique '{}' must be YYYY-YYYY",
            enrollment.annee_academique
        )));
    }
    let row = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments (student_id, class_id, annee_academique)
        VALUES ($1, $2, $3)
        RETURNING id AS id_inscription, student_id AS etudiant, class_id AS classe,
                  annee_academique, enrolled_at AS date_inscription
        "#,
    )
    .bind(enrollment.etudiant)
    .bind(enrollment.classe)
    .bind(&enrollment.annee_academique)
    .fetch_one(pool)
    .await
    .map_err(|e| map_write_error(e, "enrollment"))?;
    Ok(row)
}

/// Remove an enrollment.
pub async fn delete_enrollment(pool: &PgPool, id: i64) -> Result<(), AcademicError> {
    let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AcademicError::NotFound(format!("enrollment {id}")));
    }
    Ok(())
}

const SELECT_SESSIONS: &str = "SELECT id, code_session, type_session, date_debut, date_fin, annee_universitaire FROM exam_sessions";

/// List exam sessions, most recent first.
pub async fn list_sessions(pool: &PgPool) -> Result<Vec<ExamSession>, AcademicError> {
    let sql = format!("{SELECT_SESSIONS} ORDER BY date_debut DESC");
    let rows = sqlx::query_as::<_, SessionRow>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(ExamSession::try_from).collect()
}

/// Create an exam session; its code is derived from year and kind.
pub async fn create_session(
    pool: &PgPool,
    session: &NewExamSession,
) -> Result<ExamSession, AcademicError> {
    let code = resolve_new_session(session)?;
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO exam_sessions
            (code_session, type_session, date_debut, date_fin, annee_universitaire)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, code_session, type_session, date_debut, date_fin, annee_universitaire
        "#,
    )
    .bind(&code)
    .bind(session.type_session.as_str())
    .bind(session.date_debut)
    .bind(session.date_fin)
    .bind(&session.annee_universitaire)
    .fetch_one(pool)
    .await
    .map_err(|e| map_write_error(e, "session"))?;
    ExamSession::try_from(row)
}

const GRADE_COLUMNS: &str = "id AS id_note, student_id AS etudiant, ec_id AS ec, session_id AS session, valeur, date_validation";

/// Fetch one grade.
pub async fn get_grade(pool: &PgPool, id: i64) -> Result<Grade, AcademicError> {
    let sql = format!("SELECT {GRADE_COLUMNS} FROM grades WHERE id = $1");
    sqlx::query_as::<_, Grade>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AcademicError::NotFound(format!("grade {id}")))
}

/// Record a grade. One grade per student, course element and session.
pub async fn create_grade(pool: &PgPool, grade: &NewGrade) -> Result<Grade, AcademicError> {
    validate_new_grade(grade)?;
    let sql = format!(
        "INSERT INTO grades (student_id, ec_id, session_id, valeur) VALUES ($1, $2, $3, $4) RETURNING {GRADE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, Grade>(&sql)
        .bind(grade.etudiant)
        .bind(grade.ec)
        .bind(grade.session)
        .bind(grade.valeur)
        .fetch_one(pool)
        .await
        .map_err(|e| map_write_error(e, "grade"))?;
    Ok(row)
}

/// Apply a partial update to a grade.
pub async fn update_grade(
    pool: &PgPool,
    id: i64,
    update: &GradeUpdate,
) -> Result<Grade, AcademicError> {
    if let Some(valeur) = update.valeur {
        validate_grade_value(valeur)?;
    }
    let sql = format!(
        r#"
        UPDATE grades
        SET student_id = COALESCE($2, student_id),
            ec_id = COALESCE($3, ec_id),
            session_id = COALESCE($4, session_id),
            valeur = COALESCE($5, valeur)
        WHERE id = $1
        RETURNING {GRADE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Grade>(&sql)
        .bind(id)
        .bind(update.etudiant)
        .bind(update.ec)
        .bind(update.session)
        .bind(update.valeur)
        .fetch_optional(pool)
        .await
        .map_err(|e| map_write_error(e, "grade"))?
        .ok_or_else(|| AcademicError::NotFound(format!("grade {id}")))
}

/// Delete a grade.
pub async fn delete_grade(pool: &PgPool, id: i64) -> Result<(), AcademicError> {
    let result = sqlx::query("DELETE FROM grades WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AcademicError::NotFound(format!("grade {id}")));
    }
    Ok(())
}

/// Students enrolled in `class_id` for `academic_year`, by matricule.
pub async fn students_by_class_year(
    pool: &PgPool,
    class_id: i64,
    academic_year: &str,
) -> Result<Vec<EnrolledStudent>, AcademicError> {
    let rows = sqlx::query_as::<_, EnrolledStudent>(
        r#"
        SELECT s.id AS id_etudiant, s.matricule, s.user_id AS utilisateur,
               u.username, u.first_name, u.last_name, u.email
        FROM enrollments e
        JOIN students s ON s.id = e.student_id
        LEFT JOIN users u ON u.id = s.user_id
        WHERE e.class_id = $1 AND e.annee_academique = $2
        ORDER BY s.matricule
        "#,
    )
    .bind(class_id)
    .bind(academic_year)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All grades of a student, each with its UE weighted average.
pub async fn grades_for_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<Vec<GradeRecord>, AcademicError> {
    let rows = sqlx::query_as::<_, GradeRow>(
        r#"
        SELECT g.id, g.student_id, g.ec_id, ec.code_ec, ec.coefficient,
               ue.id AS ue_id, ue.code_ue, g.session_id, es.code_session,
               g.valeur, g.date_validation
        FROM grades g
        JOIN course_elements ec ON ec.id = g.ec_id
        JOIN teaching_units ue ON ue.id = ec.ue_id
        JOIN exam_sessions es ON es.id = g.session_id
        WHERE g.student_id = $1
        ORDER BY ue.code_ue, ec.code_ec, es.code_session
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(annotate_with_ue_average(rows))
}

fn annotate_with_ue_average(rows: Vec<GradeRow>) -> Vec<GradeRecord> {
    let mut by_ue: HashMap<i64, Vec<(f64, f64)>> = HashMap::new();
    for row in &rows {
        by_ue
            .entry(row.ue_id)
            .or_default()
            .push((row.valeur, row.coefficient));
    }
    let averages: HashMap<i64, f64> = by_ue
        .into_iter()
        .map(|(ue, grades)| (ue, weighted_average(grades)))
        .collect();

    rows.into_iter()
        .map(|row| GradeRecord {
            moyenne_ue: averages.get(&row.ue_id).copied().unwrap_or(0.0),
            id_note: row.id,
            etudiant: row.student_id,
            ec: row.ec_id,
            code_ec: row.code_ec,
            coefficient: row.coefficient,
            ue: row.ue_id,
            code_ue: row.code_ue,
            session: row.session_id,
            code_session: row.code_session,
            valeur: row.valeur,
            date_validation: row.date_validation,
        })
        .collect()
}
