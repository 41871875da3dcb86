//! Route paths.

pub const HEALTH: &str = "/api/health";

pub const USER_INFO: &str = "/user-info/";
pub const USER_INFO_UPDATE: &str = "/user-info/update/{id}";
pub const USER_INFO_ROLES: &str = "/user-info/roles/";

pub const USERS: &str = "/utilisateur/";
pub const USERS_ID: &str = "/utilisateur/{id}/";

pub const CLASSES: &str = "/classe/";
pub const CLASSES_ID: &str = "/classe/{id}/";

pub const STUDENTS_BY_CLASS_YEAR: &str = "/etudiants/classe/{class_id}/annee/{academic_year}/";
pub const STUDENT_GRADES: &str = "/etudiant/{id}/notes/";
pub const STUDENTS: &str = "/etudiant/";
pub const STUDENTS_ID: &str = "/etudiant/{id}/";

pub const ENROLLMENTS: &str = "/inscription/";
pub const ENROLLMENTS_ID: &str = "/inscription/{id}/";

pub const SESSIONS: &str = "/session/";

pub const GRADES: &str = "/note/";
pub const GRADES_ID: &str = "/note/{id}/";
