//! Request handlers.

pub mod classes;
pub mod enrollments;
pub mod grades;
pub mod health;
pub mod students;
pub mod user_info;
pub mod users;
