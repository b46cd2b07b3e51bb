use crate::error::AuthError;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Extension, Request},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::info;

const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The single shared admin credential. Handlers behind `require_admin` can
/// assume an already-authorized caller; authorization is decided here only.
#[derive(Clone)]
pub struct AdminAuth {
    password_hash: String,
    jwt_secret: String,
}

impl AdminAuth {
    pub fn new(password_hash: String, jwt_secret: String) -> Self {
        AdminAuth {
            password_hash,
            jwt_secret,
        }
    }

    pub fn login(&self, password: &str) -> Result<String, AuthError> {
        let matches =
            bcrypt::verify(password, &self.password_hash).map_err(|_| AuthError::InvalidPassword)?;
        if !matches {
            return Err(AuthError::InvalidPassword);
        }

        let now = Utc::now().timestamp();
        let claims = AdminClaims {
            role: "admin".to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let data = decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(data.claims)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn login(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let token = app_state.auth.login(&payload.password)?;
    info!("admin login succeeded");

    Ok(Json(serde_json::json!({ "token": token })))
}

pub async fn require_admin(
    Extension(app_state): Extension<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)?;
    app_state.auth.verify(token)?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_password(password: &str) -> AdminAuth {
        let hash = bcrypt::hash(password, 4).unwrap();
        AdminAuth::new(hash, "test-secret".to_string())
    }

    #[test]
    fn login_issues_a_verifiable_token() {
        let auth = auth_with_password("hunter2");

        let token = auth.login("hunter2").unwrap();
        let claims = auth.verify(&token).unwrap();

        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn login_rejects_a_wrong_password() {
        let auth = auth_with_password("hunter2");

        assert!(matches!(
            auth.login("letmein"),
            Err(AuthError::InvalidPassword)
        ));
    }

    #[test]
    fn verify_rejects_a_token_from_another_secret() {
        let auth = auth_with_password("hunter2");
        let other = AdminAuth::new(
            bcrypt::hash("hunter2", 4).unwrap(),
            "different-secret".to_string(),
        );

        let token = other.login("hunter2").unwrap();

        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let auth = auth_with_password("hunter2");

        assert!(matches!(
            auth.verify("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }
}
