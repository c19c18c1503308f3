use crate::{
    config::JwtConfig,
    database::{MongoDB, AUDIT_LOGS, INVITEES, USERS},
    middleware::auth::Claims,
    models::{
        AuditLog, ChangePasswordRequest, Invitee, LoginRequest, LoginResponse, User, UserInfo,
        OFFICE_TYPES, ROLE_INVITEE,
    },
    utils::{AppError, AppResult},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use std::collections::HashSet;
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

pub fn encode_claims(config: &JwtConfig, claims: &Claims) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_ref()),
    )
    .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
}

/// HS256 access token for `user`, valid for `config.ttl_hours`
pub fn issue_token(config: &JwtConfig, user: &User) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.employee_id.clone(),
        role: user.role.clone(),
        name: user.employee_name.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: config.audience.clone(),
        iss: config.issuer.clone(),
    };
    encode_claims(config, &claims)
}

pub fn verify_token(config: &JwtConfig, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.audience.clone()]);

    let mut issuers = HashSet::new();
    issuers.insert(config.issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

pub async fn find_user(db: &MongoDB, employee_id: &str) -> AppResult<Option<User>> {
    Ok(db
        .collection::<User>(USERS)
        .find_one(doc! { "employeeId": employee_id })
        .await?)
}

/// New invitee account: default password is the employee code, and the
/// first login must change it.
pub fn user_from_invitee(invitee: &Invitee, password_hash: String) -> User {
    User {
        employee_id: invitee.employee_id.clone(),
        employee_name: invitee.employee_name.clone(),
        cadre: invitee.cadre.clone(),
        project_name: invitee.project_name.clone(),
        password: password_hash,
        role: ROLE_INVITEE.to_string(),
        is_first_login: true,
        must_change_password: true,
        office_type: None,
        email: invitee.email.clone(),
        phone: invitee.phone.clone(),
        department: invitee.department.clone(),
        created_at: BsonDateTime::now(),
        last_login: None,
        is_active: true,
        feedback_count: 0,
        last_feedback_date: None,
        permissions: None,
    }
}

pub async fn create_user_from_invitee(db: &MongoDB, employee_id: &str) -> AppResult<Option<User>> {
    let invitee = db
        .collection::<Invitee>(INVITEES)
        .find_one(doc! { "employeeId": employee_id })
        .await?;

    let Some(invitee) = invitee else {
        return Ok(None);
    };

    if let Some(existing) = find_user(db, employee_id).await? {
        return Ok(Some(existing));
    }

    let user = user_from_invitee(&invitee, hash_password(employee_id)?);
    db.collection::<User>(USERS).insert_one(&user).await?;
    log::info!("👤 Created account for invitee {}", employee_id);

    Ok(Some(user))
}

pub async fn login(
    db: &MongoDB,
    config: &JwtConfig,
    request: &LoginRequest,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<LoginResponse> {
    let employee_id = request.employee_id.trim();

    let user = match find_user(db, employee_id).await? {
        Some(user) => user,
        None => create_user_from_invitee(db, employee_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid employee code or password".to_string()))?,
    };

    if !user.is_active {
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    if !verify_password(&request.password, &user.password) {
        return Err(AppError::Unauthorized("Invalid employee code or password".to_string()));
    }

    let now = BsonDateTime::now();
    db.collection::<User>(USERS)
        .update_one(doc! { "employeeId": employee_id }, doc! { "$set": { "lastLogin": now } })
        .await?;

    log_activity(
        db,
        employee_id,
        "login",
        doc! { "role": &user.role },
        ip_address,
        user_agent,
    )
    .await?;

    let token = issue_token(config, &user)?;
    let mut user = user;
    user.last_login = Some(now);

    Ok(LoginResponse {
        success: true,
        access_token: token,
        token_type: "bearer".to_string(),
        expires_in: config.ttl_hours * 3600,
        user: UserInfo::from(&user),
    })
}

pub async fn change_password(
    db: &MongoDB,
    employee_id: &str,
    request: &ChangePasswordRequest,
) -> AppResult<()> {
    let user = find_user(db, employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(&request.current_password, &user.password) {
        return Err(AppError::bad_request("Current password is incorrect"));
    }

    if request.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "New password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    db.collection::<User>(USERS)
        .update_one(
            doc! { "employeeId": employee_id },
            doc! { "$set": {
                "password": hash_password(&request.new_password)?,
                "mustChangePassword": false,
                "isFirstLogin": false,
                "passwordChangedAt": BsonDateTime::now(),
            }},
        )
        .await?;

    log_activity(db, employee_id, "password_change", Document::new(), None, None).await?;
    Ok(())
}

pub fn validate_office_type(office_type: &str) -> AppResult<()> {
    if OFFICE_TYPES.contains(&office_type) {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "Invalid office type. Must be 'Head Office' or 'Site Office'",
        ))
    }
}

pub async fn set_office_type(db: &MongoDB, employee_id: &str, office_type: &str) -> AppResult<bool> {
    validate_office_type(office_type)?;

    let result = db
        .collection::<User>(USERS)
        .update_one(
            doc! { "employeeId": employee_id },
            doc! { "$set": { "officeType": office_type } },
        )
        .await?;

    if result.matched_count > 0 {
        log_activity(
            db,
            employee_id,
            "office_type_set",
            doc! { "officeType": office_type },
            None,
            None,
        )
        .await?;
    }

    Ok(result.matched_count > 0)
}

pub async fn get_permissions(db: &MongoDB, employee_id: &str) -> AppResult<Vec<String>> {
    Ok(find_user(db, employee_id)
        .await?
        .map(|user| user.effective_permissions())
        .unwrap_or_default())
}

pub async fn log_activity(
    db: &MongoDB,
    employee_id: &str,
    action: &str,
    details: Document,
    ip_address: Option<String>,
    user_agent: Option<String>,
) -> AppResult<()> {
    let entry = AuditLog {
        employee_id: employee_id.to_string(),
        action: action.to_string(),
        details,
        timestamp: BsonDateTime::now(),
        ip_address,
        user_agent,
    };
    db.collection::<AuditLog>(AUDIT_LOGS).insert_one(&entry).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROLE_ADMIN;

    #[test]
    fn test_token_round_trip() {
        let config = JwtConfig::default();
        let user = User::sample(ROLE_ADMIN);

        let token = issue_token(&config, &user).unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, "EMP001");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, config.issuer);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = JwtConfig::default();
        let token = issue_token(&config, &User::sample(ROLE_INVITEE)).unwrap();

        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        };
        assert!(matches!(verify_token(&other, &token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = JwtConfig::default();
        let past = (Utc::now() - Duration::hours(2)).timestamp() as usize;
        let claims = Claims {
            sub: "EMP001".into(),
            role: ROLE_INVITEE.into(),
            name: "Rajesh Kumar".into(),
            iat: past - 3600,
            exp: past,
            jti: Uuid::new_v4().to_string(),
            aud: config.audience.clone(),
            iss: config.issuer.clone(),
        };
        let token = encode_claims(&config, &claims).unwrap();
        assert!(verify_token(&config, &token).is_err());
    }

    #[test]
    fn test_password_hashing() {
        let hashed = hash_password("EMP001").unwrap();
        assert_ne!(hashed, "EMP001");
        assert!(verify_password("EMP001", &hashed));
        assert!(!verify_password("emp001", &hashed));
        assert!(!verify_password("EMP001", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_office_type_validation() {
        assert!(validate_office_type("Head Office").is_ok());
        assert!(validate_office_type("Site Office").is_ok());
        assert!(validate_office_type("Remote").is_err());
    }

    #[test]
    fn test_user_from_invitee_defaults() {
        let mut invitee = Invitee::new("EMP007", "Anita Rao", "Lead", "Hydro");
        invitee.phone = Some("9876543210".into());
        let user = user_from_invitee(&invitee, "hash".into());
        assert_eq!(user.role, ROLE_INVITEE);
        assert!(user.must_change_password && user.is_first_login);
        assert_eq!(user.phone.as_deref(), Some("9876543210"));
    }
}
