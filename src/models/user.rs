use actix_service::{self, Transform};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    web, Error, HttpMessage,
};
use chrono::Utc;
use futures::{
    future::{ready, LocalBoxFuture, Ready},
    FutureExt,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId};
use pwhash::bcrypt;
use serde::{Deserialize, Serialize};
use std::{rc::Rc, str::FromStr};
use tracing::{debug, warn};

use super::role::UserRole;
use crate::{
    config::AppConfig,
    error::AppError,
    state::AppState,
    store::{Entity, Query},
};

#[derive(Debug, Serialize, Deserialize)]
struct UserClaims {
    aud: String,
    exp: i64,
    iss: String,
    sub: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct UserCredential {
    pub email: String,
    pub password: String,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}
#[derive(Debug, Deserialize, Serialize)]
pub struct UserResponse {
    pub _id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
#[derive(Debug, Serialize)]
pub struct UserLoginResponse {
    pub token: String,
    pub user: UserResponse,
}
/// The principal behind a request, resolved once by the middleware and passed
/// explicitly to everything that records authorship.
#[derive(Debug, Clone, PartialEq)]
pub struct ActingUser {
    pub user_id: ObjectId,
    pub user_name: String,
    pub role: UserRole,
}
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl_seconds: i64,
}
pub struct UserAuthenticationMiddleware<S> {
    service: Rc<S>,
}
pub struct UserAuthenticationMiddlewareFactory;

impl Entity for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Option<ObjectId> {
        self._id
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            _id: user._id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl User {
    pub fn hash_password(&mut self) -> Result<(), AppError> {
        self.password = bcrypt::hash(&self.password)
            .map_err(|_| AppError::Internal("HASHING_FAILED".to_string()))?;
        Ok(())
    }
    pub fn acting(&self) -> Option<ActingUser> {
        self._id.map(|user_id| ActingUser {
            user_id,
            user_name: self.name.clone(),
            role: self.role,
        })
    }
}

impl TokenKeys {
    pub fn from_config(config: &AppConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            ttl_seconds: config.token_ttl_seconds as i64,
        }
    }
    pub fn issue(&self, user_id: &ObjectId) -> Result<String, AppError> {
        let claims: UserClaims = UserClaims {
            sub: user_id.to_hex(),
            exp: Utc::now().timestamp() + self.ttl_seconds,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AppError::Internal("GENERATING_FAILED".to_string()))
    }
    pub fn verify(&self, token: &str) -> Option<ObjectId> {
        let mut validation: Validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        match decode::<UserClaims>(token, &self.decoding, &validation) {
            Ok(data) => ObjectId::from_str(&data.claims.sub).ok(),
            Err(error) => {
                debug!(%error, "rejected bearer token");
                None
            }
        }
    }
}

impl UserCredential {
    pub async fn authenticate(&self, state: &AppState) -> Result<UserLoginResponse, AppError> {
        let users = state
            .db
            .users
            .find_many(Query::filter(
                doc! { "email": self.email.trim().to_lowercase() },
            ))
            .await?;
        let user = match users.into_iter().next() {
            Some(user) if bcrypt::verify(&self.password, &user.password) => user,
            _ => return Err(AppError::validation("INVALID_COMBINATION")),
        };
        let user_id = user._id.ok_or(AppError::Unauthorized)?;

        Ok(UserLoginResponse {
            token: state.keys.issue(&user_id)?,
            user: UserResponse::from(&user),
        })
    }
}

impl<S, B> Service<ServiceRequest> for UserAuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv: Rc<S> = self.service.clone();

        async move {
            let token: Option<String> = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string());
            let state = req.app_data::<web::Data<AppState>>().cloned();

            if let (Some(token), Some(state)) = (token, state) {
                if let Some(_id) = state.keys.verify(&token) {
                    match state.db.users.find_by_id(&_id).await {
                        Ok(Some(user)) => {
                            if let Some(acting) = user.acting() {
                                req.extensions_mut().insert::<ActingUser>(acting);
                            }
                        }
                        Ok(None) => debug!(user_id = %_id, "token subject no longer exists"),
                        Err(error) => warn!(%error, "user lookup failed during authentication"),
                    }
                }
            }
            let res: ServiceResponse<B> = srv.call(req).await?;
            Ok(res)
        }
        .boxed_local()
    }
}
impl<S, B> Transform<S, ServiceRequest> for UserAuthenticationMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = UserAuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(UserAuthenticationMiddleware {
            service: Rc::new(service),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_with_the_same_keys() {
        let config = AppConfig::default();
        let keys = TokenKeys::from_config(&config);
        let user_id = ObjectId::new();

        let token = keys.issue(&user_id).unwrap();

        assert_eq!(keys.verify(&token), Some(user_id));
        assert_eq!(keys.verify("not-a-token"), None);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let mut other = AppConfig::default();
        other.jwt_secret = "another-secret-with-enough-length".to_string();
        let token = TokenKeys::from_config(&other).issue(&ObjectId::new()).unwrap();

        assert_eq!(TokenKeys::from_config(&AppConfig::default()).verify(&token), None);
    }
}
