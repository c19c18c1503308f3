use crate::{
    database::{MongoDB, INVITEES, USERS},
    models::{CabAllocation, Invitee, ProfileUpdateRequest, ResponseView, User},
    services::{auth_service, cab_service, invitee_service, response_service, validation_service},
    utils::{time::iso_opt, AppError, AppResult},
};
use mongodb::bson::{doc, Document};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub invitee: Invitee,
    pub role: Option<String>,
    pub last_login: Option<String>,
    pub must_change_password: Option<bool>,
    #[serde(rename = "rsvp_details")]
    pub rsvp_details: Option<ResponseView>,
    #[serde(rename = "cab_details")]
    pub cab_details: Option<CabAllocation>,
}

/// Roster entry overlaid with the account's contact fields
pub fn merge_profile(
    mut invitee: Invitee,
    user: Option<&User>,
    rsvp: Option<ResponseView>,
    cab: Option<CabAllocation>,
) -> Profile {
    if let Some(user) = user {
        invitee.office_type = user.office_type.clone().or(invitee.office_type);
        invitee.email = user.email.clone().or(invitee.email);
        invitee.phone = user.phone.clone().or(invitee.phone);
        invitee.department = user.department.clone().or(invitee.department);
    }
    Profile {
        invitee,
        role: user.map(|u| u.role.clone()),
        last_login: user.and_then(|u| iso_opt(u.last_login)),
        must_change_password: user.map(|u| u.must_change_password),
        rsvp_details: rsvp,
        cab_details: cab,
    }
}

pub async fn get(db: &MongoDB, employee_id: &str) -> AppResult<Profile> {
    let invitee = invitee_service::find(db, employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    let user = auth_service::find_user(db, employee_id).await?;
    let rsvp = response_service::find(db, employee_id).await?.map(ResponseView::from);
    let cab = cab_service::for_employee(db, employee_id).await?;

    Ok(merge_profile(invitee, user.as_ref(), rsvp, cab))
}

/// Validated `$set` document for a profile edit
pub fn update_document(request: &ProfileUpdateRequest) -> AppResult<Document> {
    let fields = request.provided_fields();
    if fields.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }

    let mut update = Document::new();
    for (name, value) in fields {
        match name {
            "email" if !validation_service::is_valid_email(&value) => {
                return Err(AppError::bad_request("Invalid email format"));
            }
            "officeType" => auth_service::validate_office_type(&value)?,
            _ => {}
        }
        update.insert(name, value);
    }
    Ok(update)
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdate {
    pub message: String,
    pub updated_fields: Vec<String>,
    pub user_updated: bool,
    pub invitee_updated: bool,
}

pub async fn update(db: &MongoDB, employee_id: &str, request: &ProfileUpdateRequest) -> AppResult<ProfileUpdate> {
    let update = update_document(request)?;
    let updated_fields: Vec<String> = update.keys().cloned().collect();

    let user_result = db
        .collection::<Document>(USERS)
        .update_one(doc! { "employeeId": employee_id }, doc! { "$set": update.clone() })
        .await?;
    let invitee_result = db
        .collection::<Document>(INVITEES)
        .update_one(doc! { "employeeId": employee_id }, doc! { "$set": update.clone() })
        .await?;

    let user_updated = user_result.matched_count > 0;
    let invitee_updated = invitee_result.matched_count > 0;
    if !user_updated && !invitee_updated {
        return Err(AppError::not_found("Employee not found"));
    }

    if user_updated {
        auth_service::log_activity(db, employee_id, "profile_update", doc! { "fields": updated_fields.clone() }, None, None)
            .await?;
    }
    log::info!("✏️  Profile {} updated: {}", employee_id, updated_fields.join(", "));

    Ok(ProfileUpdate {
        message: "Profile updated successfully".to_string(),
        updated_fields,
        user_updated,
        invitee_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROLE_INVITEE;

    fn request(email: Option<&str>, office: Option<&str>) -> ProfileUpdateRequest {
        ProfileUpdateRequest {
            office_type: office.map(Into::into),
            email: email.map(Into::into),
            phone: Some("9876543210".into()),
            department: None,
        }
    }

    #[test]
    fn test_update_document() {
        let update = update_document(&request(Some("rajesh@corp.com"), Some("Site Office"))).unwrap();
        assert_eq!(update.get_str("email").unwrap(), "rajesh@corp.com");
        assert_eq!(update.get_str("officeType").unwrap(), "Site Office");
        assert!(!update.contains_key("department"));
    }

    #[test]
    fn test_update_document_rejects_bad_input() {
        let err = update_document(&request(Some("not-an-email"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
        assert!(update_document(&request(None, Some("Remote"))).is_err());

        let empty = ProfileUpdateRequest {
            office_type: None,
            email: Some(" ".into()),
            phone: None,
            department: None,
        };
        assert_eq!(update_document(&empty).unwrap_err().to_string(), "No fields to update");
    }

    #[test]
    fn test_merge_prefers_account_fields() {
        let mut invitee = Invitee::new("EMP001", "Rajesh Kumar", "Manager", "Solar");
        invitee.phone = Some("111".into());
        invitee.department = Some("Projects".into());
        let mut user = User::sample(ROLE_INVITEE);
        user.phone = Some("222".into());

        let profile = merge_profile(invitee, Some(&user), None, None);
        assert_eq!(profile.invitee.phone.as_deref(), Some("222"));
        assert_eq!(profile.invitee.department.as_deref(), Some("Projects"));
        assert_eq!(profile.role.as_deref(), Some(ROLE_INVITEE));

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json["rsvp_details"].is_null());
        assert_eq!(json["employeeId"], "EMP001");
    }
}
