//! Student records, listings and grades.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use campus_core::academics::{is_academic_year, queries};
use campus_core::models::academics::{
    EnrolledStudent, GradeRecord, NewStudent, Student, StudentUpdate,
};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DataResponse, WriteResponse};

/// `GET /etudiant/` — list students.
pub async fn list_students_handler(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Student>>>> {
    let students = queries::list_students(&state.pool).await?;
    Ok(Json(DataResponse::success(students)))
}

/// `GET /etudiant/{id}/`
pub async fn get_student_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<Student>>> {
    let student = queries::get_student(&state.pool, id).await?;
    Ok(Json(DataResponse::success(student)))
}

/// `POST /etudiant/` — create a student profile.
pub async fn create_student_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<WriteResponse<Student>>)> {
    let new_student: NewStudent =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    let student = queries::create_student(&state.pool, &new_student).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse::added(student))))
}

/// `PUT /etudiant/{id}/`
pub async fn update_student_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<WriteResponse<Student>>> {
    let update: StudentUpdate =
        serde_json::from_value(body).map_err(|e| AppError::InvalidUpdate(e.to_string()))?;
    let student = queries::update_student(&state.pool, id, &update)
        .await
        .map_err(AppError::update)?;
    Ok(Json(WriteResponse::updated(student)))
}

/// `DELETE /etudiant/{id}/`
pub async fn delete_student_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<WriteResponse<()>>> {
    queries::delete_student(&state.pool, id).await?;
    Ok(Json(WriteResponse::deleted()))
}

/// `GET /etudiants/classe/{class_id}/annee/{academic_year}/` — students
/// enrolled in a class for one academic year (`YYYY-YYYY`).
pub async fn students_by_class_year_handler(
    State(state): State<AppState>,
    Path((class_id, academic_year)): Path<(i64, String)>,
) -> AppResult<Json<DataResponse<Vec<EnrolledStudent>>>> {
    if !is_academic_year(&academic_year) {
        return Err(AppError::Validation(format!(
            "invalid academic year '{academic_year}', expected YYYY-YYYY"
        )));
    }
    let students = queries::students_by_class_year(&state.pool, class_id, &academic_year).await?;
    Ok(Json(DataResponse::success(students)))
}

/// `GET /etudiant/{id}/notes/` — a student's grades with per-UE averages.
pub async fn student_grades_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<Vec<GradeRecord>>>> {
    let grades = queries::grades_for_student(&state.pool, id).await?;
    Ok(Json(DataResponse::success(grades)))
}
