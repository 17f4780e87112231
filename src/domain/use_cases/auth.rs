use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::denylist::{TokenDenylist, ACCESS_DENY_PREFIX, REFRESH_DENY_PREFIX};
use crate::auth::password::{hash_password, verify_password};
use crate::entities::token::{AuthResponse, Claims};
use crate::entities::user::{LoginUser, NewAdminUser, PublicUser, User};
use crate::errors::{AppError, AuthError};
use crate::repositories::token::TokenServiceRepository;
use crate::repositories::user::UserRepository;

pub struct AuthHandler<R, T>
where
    R: UserRepository + ?Sized,
    T: TokenServiceRepository,
{
    pub user_repo: Arc<R>,
    pub token_service: T,
    pub denylist: TokenDenylist,
}

impl<R, T> AuthHandler<R, T>
where
    R: UserRepository + ?Sized,
    T: TokenServiceRepository,
{
    pub fn new(user_repo: Arc<R>, token_service: T, denylist: TokenDenylist) -> Self {
        AuthHandler {
            user_repo,
            token_service,
            denylist,
        }
    }

    /// Logs in a user by validating credentials and generating JWTs
    pub async fn login(&self, request: LoginUser) -> Result<AuthResponse, AuthError> {
        request.validate()?;

        let user = self
            .user_repo
            .get_user_by_username(request.username.trim())
            .await
            .map_err(|e| {
                tracing::error!("User lookup failed during login: {}", e);
                AuthError::WrongCredentials
            })?
            .ok_or(AuthError::WrongCredentials)?;

        let is_password_valid = verify_password(&request.password, &user.password_hash)?;
        if !is_password_valid {
            tracing::warn!(username = %user.username, "Rejected login attempt");
            return Err(AuthError::WrongCredentials);
        }

        let response = self.create_auth_response(&user)?;

        tracing::info!(user_id = %user.id, "User logged in successfully");
        Ok(response)
    }

    pub fn create_auth_response(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let access_token = self.token_service.create_jwt(user).map_err(|e| {
            tracing::warn!("Failed to create JWT: {}", e);
            AuthError::TokenCreation
        })?;

        let refresh_token = self.token_service.create_refresh_jwt(&user.id).map_err(|e| {
            tracing::warn!("Failed to create refresh JWT: {}", e);
            AuthError::TokenCreation
        })?;

        Ok(AuthResponse::new(access_token, refresh_token, PublicUser::from(user)))
    }

    /// Issues a fresh pair and retires the presented refresh token.
    pub async fn refresh_token(&self, token: &str) -> Result<AuthResponse, AuthError> {
        let decoded = self.token_service.decode_refresh_jwt(token)?;
        if self.denylist.is_revoked(REFRESH_DENY_PREFIX, token).await? {
            return Err(AuthError::TokenRevoked);
        }

        let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AuthError::InvalidUserId)?;
        let user = self
            .user_repo
            .get_user_by_id(&user_id)
            .await
            .map_err(|_| AuthError::WrongCredentials)?
            .ok_or(AuthError::WrongCredentials)?;

        let response = self.create_auth_response(&user)?;
        self.denylist
            .revoke(REFRESH_DENY_PREFIX, token, decoded.claims.exp)
            .await?;
        Ok(response)
    }

    /// Denies the access token and, when given, the refresh token until they expire.
    pub async fn logout(
        &self,
        access_token: &str,
        claims: &Claims,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.denylist
            .revoke(ACCESS_DENY_PREFIX, access_token, claims.exp)
            .await?;

        if let Some(refresh_token) = refresh_token.filter(|t| !t.trim().is_empty()) {
            let decoded = self.token_service.decode_refresh_jwt(refresh_token)?;
            if decoded.claims.sub != claims.sub {
                return Err(AuthError::Forbidden("Refresh token belongs to another user".into()));
            }
            self.denylist
                .revoke(REFRESH_DENY_PREFIX, refresh_token, decoded.claims.exp)
                .await?;
        }

        tracing::info!(user_id = %claims.sub, revoked = self.denylist.is_configured(), "User logged out");
        Ok(())
    }

    pub async fn me(&self, claims: &Claims) -> Result<PublicUser, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;
        let user = self
            .user_repo
            .get_user_by_id(&user_id)
            .await
            .map_err(|_| AuthError::InvalidToken)?
            .ok_or(AuthError::InvalidToken)?;
        Ok(PublicUser::from(&user))
    }

    /// Creates the configured admin unless that username already exists.
    /// Returns whether a user was created.
    pub async fn ensure_admin_user(&self, admin: NewAdminUser) -> Result<bool, AppError> {
        admin.validate()?;

        if self
            .user_repo
            .get_user_by_username(admin.username.trim())
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let password_hash = hash_password(&admin.password)?;
        match self.user_repo.create_user(&admin.prepare_for_insert(password_hash)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "Admin user created");
                Ok(true)
            }
            Err(AppError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtService;
    use crate::entities::user::UserInsert;
    use crate::repositories::user::MockUserRepository;
    use crate::settings::test_config;

    const PASSWORD: &str = "Tr0ub4dour&Horse-Battery";

    fn admin_user() -> User {
        UserInsert {
            username: "admin".into(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role: "admin".into(),
        }
        .into_user()
    }

    fn handler(repo: MockUserRepository) -> AuthHandler<MockUserRepository, JwtService> {
        AuthHandler::new(Arc::new(repo), JwtService::new(&test_config()), TokenDenylist::default())
    }

    #[tokio::test]
    async fn login_issues_tokens_for_valid_credentials() {
        let user = admin_user();
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        let handler = handler(repo);

        let response = handler
            .login(LoginUser {
                username: "admin".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.user.role, "admin");

        let claims = handler.token_service.decode_jwt(&response.access_token).unwrap().claims;
        assert!(claims.is_admin());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let user = admin_user();
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        let handler = handler(repo);

        let err = handler
            .login(LoginUser {
                username: "admin".into(),
                password: "not-the-password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WrongCredentials));
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let user = admin_user();
        let handler = handler(MockUserRepository::new());
        let access = handler.token_service.create_jwt(&user).unwrap();

        assert!(handler.refresh_token(&access).await.is_err());
    }

    #[tokio::test]
    async fn existing_admin_is_not_recreated() {
        let user = admin_user();
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_create_user().never();
        let handler = handler(repo);

        let created = handler
            .ensure_admin_user(NewAdminUser {
                username: "admin".into(),
                password: PASSWORD.into(),
            })
            .await
            .unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn weak_admin_password_is_refused() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_user_by_username().never();
        let handler = handler(repo);

        let err = handler
            .ensure_admin_user(NewAdminUser {
                username: "admin".into(),
                password: "password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
