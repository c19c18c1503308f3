use serde::{Deserialize, Serialize};

/// Conference invitee (one document per employee on the roster)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitee {
    pub employee_id: String,
    pub employee_name: String,
    pub cadre: String,
    pub project_name: String,
    #[serde(default)]
    pub has_responded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_type: Option<String>,
}

impl Invitee {
    pub fn new(employee_id: &str, employee_name: &str, cadre: &str, project_name: &str) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            employee_name: employee_name.to_string(),
            cadre: cadre.to_string(),
            project_name: project_name.to_string(),
            has_responded: false,
            email: None,
            department: None,
            phone: None,
            office_type: None,
        }
    }
}

/// Reduced view used by the "who still owes an RSVP" list
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnrespondedInvitee {
    pub employee_id: String,
    pub employee_name: String,
    pub cadre: String,
    pub project_name: String,
}

impl From<Invitee> for UnrespondedInvitee {
    fn from(inv: Invitee) -> Self {
        Self {
            employee_id: inv.employee_id,
            employee_name: inv.employee_name,
            cadre: inv.cadre,
            project_name: inv.project_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteeFilter {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub cadre: Option<String>,
    pub project_name: Option<String>,
    pub has_responded: Option<bool>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResult {
    pub message: String,
    pub inserted_count: usize,
}
