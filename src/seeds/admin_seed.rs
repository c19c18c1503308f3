use crate::config::AppConfig;
use crate::database::{MongoDB, USERS};
use crate::models::{User, ROLE_ADMIN};
use crate::services::auth_service;
use mongodb::bson::{doc, DateTime as BsonDateTime};

/// Admin account built from the configured credentials
pub fn admin_user(employee_id: &str, password_hash: String) -> User {
    User {
        employee_id: employee_id.to_string(),
        employee_name: "Administrator".to_string(),
        cadre: "Admin".to_string(),
        project_name: "PM Connect".to_string(),
        password: password_hash,
        role: ROLE_ADMIN.to_string(),
        is_first_login: false,
        must_change_password: false,
        office_type: Some("Head Office".to_string()),
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

/// Creates the admin account from ADMIN_EMPLOYEE_ID / ADMIN_PASSWORD when it
/// does not exist yet. Never touches an existing account.
pub async fn seed_admin(db: &MongoDB, config: &AppConfig) {
    let (Some(employee_id), Some(password)) = (&config.admin_employee_id, &config.admin_password) else {
        log::info!("👤 Admin seed: ADMIN_EMPLOYEE_ID / ADMIN_PASSWORD not set, skipping");
        return;
    };

    let collection = db.collection::<User>(USERS);
    match collection.count_documents(doc! { "employeeId": employee_id }).await {
        Ok(0) => {}
        Ok(_) => {
            log::info!("👤 Admin seed: account {} already exists, skipping", employee_id);
            return;
        }
        Err(e) => {
            log::error!("   ❌ Admin seed lookup failed: {}", e);
            return;
        }
    }

    let password_hash = match auth_service::hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("   ❌ Admin seed could not hash the password: {}", e);
            return;
        }
    };

    match collection.insert_one(admin_user(employee_id, password_hash)).await {
        Ok(_) => log::info!("   ✅ Admin account {} created", employee_id),
        Err(e) => log::error!("   ❌ Failed to seed admin account: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_user_has_admin_permissions() {
        let user = admin_user("ADMIN01", "hash".to_string());
        assert!(user.is_admin());
        assert!(!user.must_change_password);
        assert!(user.effective_permissions().contains(&"export_data".to_string()));
    }
}
