use jsonwebtoken::{encode, Header, decode, Validation, TokenData, Algorithm};
use chrono::{Utc, Duration};
use uuid::Uuid;
use crate::entities::token::{Claims, RefreshClaims, UploadClaims};
use crate::entities::user::User;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, JwtKeys};
use crate::errors::AuthError;

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_expiration: Duration,
    refresh_expiration: Duration,
    upload_expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            access_expiration: Duration::minutes(config.jwt_expiration_minutes),
            refresh_expiration: Duration::days(config.refresh_token_exp_days),
            upload_expiration: Duration::seconds(config.signed_url_ttl_secs as i64),
        }
    }

    pub fn upload_ttl_secs(&self) -> i64 {
        self.upload_expiration.num_seconds()
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation
    }
}

impl TokenServiceRepository for JwtService {
    fn create_jwt(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.access_expiration).timestamp() as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(AuthError::from)
    }

    fn create_refresh_jwt(&self, user_id: &Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.refresh_expiration).timestamp() as usize;

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.refresh_encoding).map_err(AuthError::from)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        decode::<Claims>(token, &self.keys.decoding, &Self::validation()).map_err(AuthError::from)
    }

    fn decode_refresh_jwt(&self, token: &str) -> Result<TokenData<RefreshClaims>, AuthError> {
        decode::<RefreshClaims>(token, &self.keys.refresh_decoding, &Self::validation())
            .map_err(AuthError::from)
    }

    fn create_upload_token(&self, key: &str, content_type: Option<&str>) -> Result<String, AuthError> {
        let exp = (Utc::now() + self.upload_expiration).timestamp() as usize;
        let claims = UploadClaims {
            key: key.to_string(),
            content_type: content_type.map(str::to_string),
            exp,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(AuthError::from)
    }

    fn decode_upload_token(&self, token: &str) -> Result<UploadClaims, AuthError> {
        decode::<UploadClaims>(token, &self.keys.decoding, &Self::validation())
            .map(|data| data.claims)
            .map_err(AuthError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::{UserInsert, ADMIN_ROLE};
    use crate::settings::test_config;

    fn admin() -> User {
        UserInsert {
            username: "admin".into(),
            password_hash: "hash".into(),
            role: ADMIN_ROLE.into(),
        }
        .into_user()
    }

    #[test]
    fn access_token_round_trips_claims() {
        let service = JwtService::new(&test_config());
        let user = admin();

        let token = service.create_jwt(&user).unwrap();
        let claims = service.decode_jwt(&token).unwrap().claims;
        assert_eq!(claims.sub, user.id.to_string());
        assert!(claims.is_admin());
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let service = JwtService::new(&test_config());
        let user = admin();

        let refresh = service.create_refresh_jwt(&user.id).unwrap();
        assert!(service.decode_jwt(&refresh).is_err());

        let upload = service.create_upload_token("logo/a.png", Some("image/png")).unwrap();
        assert!(service.decode_jwt(&upload).is_err());
        assert_eq!(service.decode_upload_token(&upload).unwrap().key, "logo/a.png");
    }
}
