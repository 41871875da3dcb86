//! Identity domain models.
//!
//! Local mirror of identity-provider users. These are internal domain
//! models; the API layer serializes them as-is.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Column width of `users.telephone`.
pub const MAX_PHONE_LEN: usize = 15;

/// International phone number: optional `+`, 8 to 15 digits.
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("valid phone regex"));

/// Local user record, keyed by the provider's preferred username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub sexe: Option<Sexe>,
    pub telephone: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub address_profil: Option<String>,
    pub newsletter_abonne: bool,
    pub blog_posts: bool,
    /// Role labels currently associated with the user, ordered by name.
    pub roles: Vec<String>,
}

impl User {
    /// `"jdoe (John Doe)"`.
    pub fn display_name(&self) -> String {
        let full_name = format!("{} {}", self.first_name, self.last_name);
        format!("{} ({})", self.username, full_name.trim())
    }
}

/// Role label, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Gender marker stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sexe {
    #[serde(rename = "H")]
    Homme,
    #[serde(rename = "F")]
    Femme,
}

impl Sexe {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sexe::Homme => "H",
            Sexe::Femme => "F",
        }
    }

    /// Parse the database text representation.
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "H" => Some(Sexe::Homme),
            "F" => Some(Sexe::Femme),
            _ => None,
        }
    }
}

/// Provider-owned attributes copied onto the local user at each login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
}

/// Result of a find-or-create-then-update pass.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub user: User,
    pub created: bool,
}

/// Locally-owned profile fields the user may edit. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub sexe: Option<Sexe>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub date_naissance: Option<NaiveDate>,
    #[serde(default)]
    pub address_profil: Option<String>,
    #[serde(default)]
    pub newsletter_abonne: Option<bool>,
    #[serde(default)]
    pub blog_posts: Option<bool>,
}

impl ProfileUpdate {
    /// Check field formats. Returns one message per invalid field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Some(telephone) = &self.telephone
            && (telephone.chars().count() > MAX_PHONE_LEN || !PHONE.is_match(telephone))
        {
            errors.push(format!("telephone: '{telephone}' is not an international number"));
        }
        if let Some(date) = self.date_naissance
            && date > Utc::now().date_naive()
        {
            errors.push("date_naissance: must not be in the future".to_string());
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Apply the set fields onto `user`.
    pub fn apply(&self, user: &mut User) {
        if let Some(sexe) = self.sexe {
            user.sexe = Some(sexe);
        }
        if let Some(telephone) = &self.telephone {
            user.telephone = Some(telephone.clone());
        }
        if let Some(date) = self.date_naissance {
            user.date_naissance = Some(date);
        }
        if let Some(address) = &self.address_profil {
            user.address_profil = Some(address.clone());
        }
        if let Some(newsletter) = self.newsletter_abonne {
            user.newsletter_abonne = newsletter;
        }
        if let Some(blog_posts) = self.blog_posts {
            user.blog_posts = blog_posts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_update_accepts_valid_phone() {
        let update = ProfileUpdate {
            telephone: Some("+22177123456".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn profile_update_rejects_bad_phone() {
        let update = ProfileUpdate {
            telephone: Some("12-34".into()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("telephone"));
    }

    #[test]
    fn profile_update_rejects_phone_wider_than_column() {
        let update = ProfileUpdate {
            telephone: Some("+123456789012345".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = ProfileUpdate {
            telephone: Some("+12345678901234".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn profile_update_rejects_unknown_fields() {
        let parsed = serde_json::from_value::<ProfileUpdate>(json!({"username": "root"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn sexe_uses_single_letter_codes() {
        let update: ProfileUpdate = serde_json::from_value(json!({"sexe": "F"})).unwrap();
        assert_eq!(update.sexe, Some(Sexe::Femme));
        assert_eq!(Sexe::from_db("H"), Some(Sexe::Homme));
        assert_eq!(Sexe::Femme.as_str(), "F");
    }

    #[test]
    fn display_name_includes_full_name() {
        let user = User {
            id: 1,
            username: "jdoe".into(),
            email: None,
            email_verified: false,
            first_name: "John".into(),
            last_name: "Doe".into(),
            last_login: None,
            date_joined: Utc::now(),
            sexe: None,
            telephone: None,
            date_naissance: None,
            address_profil: None,
            newsletter_abonne: false,
            blog_posts: false,
            roles: vec![],
        };
        assert_eq!(user.display_name(), "jdoe (John Doe)");
    }
}
