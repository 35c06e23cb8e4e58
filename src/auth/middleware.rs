use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    tracing::debug!(path = %req.path(), reason = message, "Rejected request");
    let resp = ApiError::Unauthorized(message.to_string()).error_response();
    req.into_response(resp)
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(value) => value.to_owned(),
            Err(_) => return Ok(reject(req, "Invalid Authorization header encoding")),
        },
        None => return Ok(reject(req, "Missing Authorization header")),
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return Ok(reject(req, "Authorization header must start with Bearer")),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return Ok(reject(req, "Invalid or expired token")),
    };

    let role = match Role::from_id(claims.role) {
        Some(role) => role,
        None => return Ok(reject(req, "Invalid role")),
    };

    let auth_user = AuthUser {
        user_id: claims.user_id,
        role,
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::token;
    use crate::models::TokenType;
    use actix_web::{App, HttpResponse, http::StatusCode, middleware::from_fn, test, web};

    fn config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "test-secret".into(),
            server_addr: String::new(),
            api_prefix: "/api".into(),
            log_level: "info".into(),
            rate_protected_per_min: 1000,
            rate_clock_per_min: 10,
            arrival_tolerance_minutes: 5,
            overtime_threshold_hours: 7,
        }
    }

    async fn whoami(auth: AuthUser) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "user_id": auth.user_id,
            "role": auth.role.to_string(),
        }))
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new().app_data(Data::new(config())).service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .route("/whoami", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get().uri("/api/whoami").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing Authorization header");
    }

    #[actix_web::test]
    async fn non_bearer_header_is_unauthorized() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", "Basic abc"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn unknown_role_is_unauthorized() {
        let app = app!();
        let bearer = format!("Bearer {}", token(3, 42, TokenType::Access, "test-secret"));
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", bearer))
            .to_request();
        let resp = test::call_service(&app, req).await;

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid role");
    }

    #[actix_web::test]
    async fn valid_token_reaches_handler() {
        let app = app!();
        let bearer = format!("Bearer {}", token(3, 3, TokenType::Access, "test-secret"));
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .insert_header(("Authorization", bearer))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user_id"], 3);
        assert_eq!(body["role"], "manager");
    }
}
