use crate::utils::time::iso_opt;
use mongodb::bson::{DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INVITEE: &str = "invitee";

pub const OFFICE_TYPES: [&str; 2] = ["Head Office", "Site Office"];

pub const ADMIN_PERMISSIONS: [&str; 7] = [
    "manage_invitees",
    "manage_responses",
    "manage_agenda",
    "manage_gallery",
    "manage_cab_allocations",
    "export_data",
    "view_analytics",
];

pub const INVITEE_PERMISSIONS: [&str; 5] = [
    "view_own_profile",
    "submit_rsvp",
    "view_agenda",
    "upload_gallery",
    "view_cab_details",
];

/// Login account; created lazily from the invitee roster on first login
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default)]
    pub cadre: String,
    #[serde(default)]
    pub project_name: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub is_first_login: bool,
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default)]
    pub office_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub created_at: BsonDateTime,
    #[serde(default)]
    pub last_login: Option<BsonDateTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub feedback_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_feedback_date: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Stored override for admins, otherwise the role's default set
    pub fn effective_permissions(&self) -> Vec<String> {
        if self.is_admin() {
            self.permissions
                .clone()
                .unwrap_or_else(|| ADMIN_PERMISSIONS.iter().map(|p| p.to_string()).collect())
        } else {
            INVITEE_PERMISSIONS.iter().map(|p| p.to_string()).collect()
        }
    }

    #[cfg(test)]
    pub fn sample(role: &str) -> User {
        User {
            employee_id: "EMP001".into(),
            employee_name: "Rajesh Kumar".into(),
            cadre: "Manager".into(),
            project_name: "Solar".into(),
            password: String::new(),
            role: role.into(),
            is_first_login: true,
            must_change_password: true,
            office_type: None,
            email: None,
            phone: None,
            department: None,
            created_at: BsonDateTime::now(),
            last_login: None,
            is_active: true,
            feedback_count: 0,
            last_feedback_date: None,
            permissions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub employee_id: String,
    pub employee_name: String,
    pub cadre: String,
    pub project_name: String,
    pub role: String,
    pub is_first_login: bool,
    pub must_change_password: bool,
    pub office_type: Option<String>,
    pub last_login: Option<String>,
    pub permissions: Vec<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            employee_id: user.employee_id.clone(),
            employee_name: user.employee_name.clone(),
            cadre: user.cadre.clone(),
            project_name: user.project_name.clone(),
            role: user.role.clone(),
            is_first_login: user.is_first_login,
            must_change_password: user.must_change_password,
            office_type: user.office_type.clone(),
            last_login: iso_opt(user.last_login),
            permissions: user.effective_permissions(),
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub employee_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficeTypeRequest {
    pub office_type: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub office_type: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

impl ProfileUpdateRequest {
    /// Non-empty fields as (camelCase name, value) pairs
    pub fn provided_fields(&self) -> Vec<(&'static str, String)> {
        [
            ("officeType", &self.office_type),
            ("email", &self.email),
            ("phone", &self.phone),
            ("department", &self.department),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (name, v.to_string()))
        })
        .collect()
    }
}

/// Audit trail entry (login, password change, profile edits)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub employee_id: String,
    pub action: String,
    pub details: Document,
    pub timestamp: BsonDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permissions_by_role() {
        assert_eq!(User::sample(ROLE_ADMIN).effective_permissions().len(), 7);
        assert!(User::sample(ROLE_INVITEE)
            .effective_permissions()
            .contains(&"submit_rsvp".to_string()));
    }

    #[test]
    fn test_admin_permission_override() {
        let mut admin = User::sample(ROLE_ADMIN);
        admin.permissions = Some(vec!["view_analytics".into()]);
        assert_eq!(admin.effective_permissions(), vec!["view_analytics".to_string()]);
    }

    #[test]
    fn test_profile_update_skips_blank_fields() {
        let req = ProfileUpdateRequest {
            office_type: Some("Head Office".into()),
            email: Some("  ".into()),
            phone: None,
            department: Some(" Projects ".into()),
        };
        assert_eq!(
            req.provided_fields(),
            vec![("officeType", "Head Office".to_string()), ("department", "Projects".to_string())]
        );
    }
}
