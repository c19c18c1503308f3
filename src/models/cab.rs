use serde::{Deserialize, Serialize};

pub const MAX_CAB_MEMBERS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CabAllocation {
    pub cab_id: String,
    pub cab_number: i64,
    pub assigned_members: Vec<String>,
    pub pickup_location: String,
    pub pickup_time: String,
}

/// Roster details for one cab member
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CabMemberDetail {
    pub employee_id: String,
    pub employee_name: String,
    pub cadre: String,
    pub project_name: String,
    pub has_responded: bool,
    pub mobile_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_current_user: Option<bool>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedCabAllocation {
    #[serde(flatten)]
    pub allocation: CabAllocation,
    pub member_details: Vec<CabMemberDetail>,
    pub total_members: usize,
    pub responded_members: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CabSummary {
    pub total_cabs: usize,
    pub total_members: usize,
    pub responded_members: usize,
}
