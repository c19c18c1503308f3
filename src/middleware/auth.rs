use crate::config::AppConfig;
use crate::services::auth_service;
use crate::utils::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // employeeId
    pub role: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == crate::models::ROLE_ADMIN
    }

    /// 403 unless the caller is an admin
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// 403 unless the caller owns `employee_id` or is an admin
    pub fn require_self_or_admin(&self, employee_id: &str) -> Result<(), AppError> {
        if self.is_admin() || self.sub == employee_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("You can only modify your own profile".to_string()))
        }
    }
}

/// Verifies `Authorization: Bearer <jwt>` and stores the decoded `Claims`
/// in the request extensions for `web::ReqData<Claims>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight never carries credentials
        if req.method() == actix_web::http::Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let verified = bearer_token(&req).and_then(|token| {
            let config = req
                .app_data::<web::Data<AppConfig>>()
                .ok_or_else(|| AppError::internal("Auth configuration missing"))?;
            auth_service::verify_token(&config.jwt, &token)
        });

        match verified {
            Ok(claims) => {
                log::debug!("🔑 Authenticated {} ({})", claims.sub, claims.role);
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(e) => {
                log::warn!("🚫 {} {} rejected: {}", req.method(), req.path(), e);
                Box::pin(async move { Err(e.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, ROLE_ADMIN};
    use actix_web::{http::StatusCode, test as actix_test, App, HttpResponse};

    fn test_config() -> AppConfig {
        AppConfig::for_tests()
    }

    fn admin_user() -> User {
        User::sample(ROLE_ADMIN)
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(format!("{}:{}", claims.sub, claims.role))
    }

    #[actix_web::test]
    async fn test_missing_token_is_rejected() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .service(web::scope("/api").wrap(AuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/me").to_request();
        let err = actix_test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler() {
        let config = test_config();
        let token = auth_service::issue_token(&config.jwt, &admin_user()).unwrap();

        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .service(web::scope("/api").wrap(AuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = actix_test::read_body(resp).await;
        assert_eq!(body, "EMP001:admin");
    }

    #[actix_web::test]
    async fn test_garbage_token_is_rejected() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .service(web::scope("/api").wrap(AuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_admin() {
        let mut claims = Claims {
            sub: "EMP001".into(),
            role: "invitee".into(),
            name: "Rajesh".into(),
            iat: 0,
            exp: 0,
            jti: "x".into(),
            aud: "a".into(),
            iss: "i".into(),
        };
        assert!(matches!(claims.require_admin(), Err(AppError::Forbidden(_))));
        assert!(claims.require_self_or_admin("EMP001").is_ok());
        assert!(matches!(claims.require_self_or_admin("EMP002"), Err(AppError::Forbidden(_))));
        claims.role = "admin".into();
        assert!(claims.require_admin().is_ok());
        assert!(claims.require_self_or_admin("EMP002").is_ok());
    }
}
