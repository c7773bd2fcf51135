//! One-legged signature authentication for requests under the `gf/v2`
//! namespace.
//!
//! This follows simple OAuth 1.0a (RFC 5849) as closely as the query-string
//! transport allows, with two differences: there is no token, only a
//! consumer key pair; and the parameters travel in the query string rather
//! than the `Authorization` header.

use std::sync::Arc;

use gfrest_sdk::signature::{
    self, API_KEY_PARAM, EXPIRES_PARAM, SIGNATURE_PARAM, SignatureError, SignedRequest,
};
use tracing::{debug, error, warn};

use super::credential::{Credential, PrincipalId};
use super::directory::UserDirectory;
use super::request::RestRequest;
use super::session::AuthenticationSession;
use super::AuthError;
use crate::config::{ConfigStore, RestConfig, WebApiSettings};

/// Result of running the signature authentication on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No principal; nothing to report. Other mechanisms may still apply.
    Unauthenticated,
    /// The request acts as this principal.
    AuthenticatedAs(PrincipalId),
    /// The request carried credentials that did not validate.
    Rejected(AuthError),
}

/// Why the signature authentication did not produce a principal.
///
/// Only used for logging; callers see the generic [`AuthError`] returned by
/// [`AuthFailure::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("missing authentication parameter")]
    MissingParameter,
    #[error("web API is disabled")]
    FeatureDisabled,
    #[error("unknown public key")]
    UnknownKey,
    #[error("public key matches more than one user")]
    AmbiguousKey,
    #[error("no private key configured")]
    MissingSecret,
    #[error("no principal configured")]
    MissingPrincipal,
    #[error("user directory unavailable")]
    DirectoryUnavailable,
    #[error("signature expired")]
    Expired,
    #[error("signature mismatch")]
    BadSignature,
}

impl AuthFailure {
    /// The error to surface, or `None` when the mechanism declines silently.
    pub fn error(self) -> Option<AuthError> {
        match self {
            AuthFailure::MissingParameter => None,
            AuthFailure::FeatureDisabled
            | AuthFailure::UnknownKey
            | AuthFailure::AmbiguousKey
            | AuthFailure::MissingSecret
            | AuthFailure::MissingPrincipal
            | AuthFailure::DirectoryUnavailable => Some(AuthError::invalid_api_key()),
            AuthFailure::Expired | AuthFailure::BadSignature => {
                Some(AuthError::invalid_signature())
            }
        }
    }
}

impl From<SignatureError> for AuthFailure {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Expired => AuthFailure::Expired,
            SignatureError::SignatureMismatch => AuthFailure::BadSignature,
        }
    }
}

/// Authenticates requests signed with a public/private key pair.
///
/// Credentials come from the web API settings (the system key) and from the
/// user directory (per-user keys). Both are only read.
#[derive(Clone)]
pub struct Authenticator {
    rest: RestConfig,
    settings: ConfigStore<WebApiSettings>,
    directory: Arc<dyn UserDirectory>,
}

impl Authenticator {
    pub fn new(
        rest: RestConfig,
        settings: ConfigStore<WebApiSettings>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            rest,
            settings,
            directory,
        }
    }

    /// Start the two-stage authenticate / resolve-error protocol for `request`.
    pub fn session<'a>(&'a self, request: &'a RestRequest) -> AuthenticationSession<'a> {
        AuthenticationSession::new(self, request)
    }

    /// Whether `request` targets this add-on's part of the REST API.
    pub fn is_request_to_rest_api(&self, request: &RestRequest) -> bool {
        request.path().contains(&self.rest.api_marker())
    }

    /// The signed route: the request path without the site home path, the
    /// namespace prefix, and one trailing slash.
    pub fn route(&self, request: &RestRequest) -> String {
        let path = request.path();
        let path = path
            .strip_prefix(self.rest.home_path.as_str())
            .unwrap_or(path);
        let route = path.replace(&self.rest.namespace_prefix(), "");
        match route.strip_suffix('/') {
            Some(trimmed) => trimmed.to_string(),
            None => route,
        }
    }

    /// Authenticate against the current time.
    pub async fn authenticate(
        &self,
        request: &RestRequest,
        current: Option<PrincipalId>,
    ) -> AuthOutcome {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        self.authenticate_at(request, current, now).await
    }

    /// Authenticate `request` as of the unix time `now`.
    ///
    /// A principal resolved by an earlier mechanism is kept as is, and
    /// requests outside the namespace pass through untouched.
    pub async fn authenticate_at(
        &self,
        request: &RestRequest,
        current: Option<PrincipalId>,
        now: i64,
    ) -> AuthOutcome {
        if let Some(principal) = current {
            return AuthOutcome::AuthenticatedAs(principal);
        }
        if !self.is_request_to_rest_api(request) {
            return AuthOutcome::Unauthenticated;
        }

        match self.perform_signature_authentication(request, now).await {
            Ok(principal) => {
                debug!(%principal, path = request.path(), "Signed request authenticated");
                AuthOutcome::AuthenticatedAs(principal)
            }
            Err(failure) => {
                debug!(reason = %failure, path = request.path(), "Signed request not authenticated");
                match failure.error() {
                    Some(error) => AuthOutcome::Rejected(error),
                    None => AuthOutcome::Unauthenticated,
                }
            }
        }
    }

    async fn perform_signature_authentication(
        &self,
        request: &RestRequest,
        now: i64,
    ) -> Result<PrincipalId, AuthFailure> {
        let (Some(api_key), Some(_), Some(_)) = (
            request.non_empty_param(API_KEY_PARAM),
            request.non_empty_param(EXPIRES_PARAM),
            request.non_empty_param(SIGNATURE_PARAM),
        ) else {
            return Err(AuthFailure::MissingParameter);
        };

        let credential = self.resolve_credential(api_key).await?;
        self.check_signature(request, &credential.private_key, now)?;
        Ok(credential.principal_id)
    }

    /// Recompute the signature of `request` under `private_key` and check it
    /// together with the expiry.
    pub fn verify_signature(
        &self,
        request: &RestRequest,
        private_key: &str,
        now: i64,
    ) -> Result<(), AuthError> {
        self.check_signature(request, private_key, now)
            .map_err(|_| AuthError::invalid_signature())
    }

    fn check_signature(
        &self,
        request: &RestRequest,
        private_key: &str,
        now: i64,
    ) -> Result<(), AuthFailure> {
        let signed = SignedRequest {
            api_key: request.query_param(API_KEY_PARAM).unwrap_or_default().to_string(),
            method: request.method().to_ascii_uppercase(),
            route: self.route(request),
            expires: signature::parse_expires(
                request.query_param(EXPIRES_PARAM).unwrap_or_default(),
            ),
            signature: request
                .query_param(SIGNATURE_PARAM)
                .unwrap_or_default()
                .to_string(),
        };
        signed.verify(private_key.as_bytes(), now)?;
        Ok(())
    }

    /// Resolve `public_key` to a credential, or `None` when it does not
    /// identify a usable one.
    pub async fn lookup_credential(&self, public_key: &str) -> Option<Credential> {
        self.resolve_credential(public_key).await.ok()
    }

    async fn resolve_credential(&self, public_key: &str) -> Result<Credential, AuthFailure> {
        let (enabled, system_key) = {
            let settings = self.settings.read().await;
            let system_key = (settings.public_key == public_key).then(|| {
                (
                    settings.private_key.clone(),
                    settings.impersonate_account,
                )
            });
            (settings.enabled, system_key)
        };

        if !enabled {
            return Err(AuthFailure::FeatureDisabled);
        }

        let (principal_id, private_key) = match system_key {
            Some((private_key, impersonate)) => {
                if private_key.is_empty() {
                    return Err(AuthFailure::MissingSecret);
                }
                let principal = impersonate
                    .map(PrincipalId)
                    .ok_or(AuthFailure::MissingPrincipal)?;
                (principal, private_key)
            }
            None => self.lookup_user_key(public_key).await?,
        };

        if !principal_id.is_valid() {
            return Err(AuthFailure::MissingPrincipal);
        }
        if private_key.is_empty() {
            return Err(AuthFailure::MissingSecret);
        }

        Ok(Credential {
            public_key: public_key.to_string(),
            private_key,
            principal_id,
        })
    }

    async fn lookup_user_key(&self, public_key: &str) -> Result<(PrincipalId, String), AuthFailure> {
        let users = self
            .directory
            .find_users_by_public_key(public_key, 2)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up user by public key");
                AuthFailure::DirectoryUnavailable
            })?;

        let user = match users.as_slice() {
            [] => return Err(AuthFailure::UnknownKey),
            [user] => *user,
            _ => {
                warn!(public_key, "Public key is stored for more than one user");
                return Err(AuthFailure::AmbiguousKey);
            }
        };

        let private_key = self
            .directory
            .private_key(user)
            .await
            .map_err(|e| {
                error!(error = %e, %user, "Failed to read user private key");
                AuthFailure::DirectoryUnavailable
            })?
            .filter(|key| !key.is_empty())
            .ok_or(AuthFailure::MissingSecret)?;

        Ok((user, private_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::{DirectoryError, MemoryUserDirectory};
    use async_trait::async_trait;

    const NOW: i64 = 1_700_000_000;
    const FAR_FUTURE: i64 = 9_999_999_999;

    fn settings(enabled: bool) -> WebApiSettings {
        WebApiSettings {
            enabled,
            public_key: "sys".to_string(),
            private_key: "sys-secret".to_string(),
            impersonate_account: Some(1),
        }
    }

    fn directory() -> MemoryUserDirectory {
        MemoryUserDirectory::new()
            .with_user(PrincipalId(42), "pk1", "secret")
            .with_user(PrincipalId(7), "upk", "user-secret")
            .with_user(PrincipalId(8), "dup", "a")
            .with_user(PrincipalId(9), "dup", "b")
            .with_public_key_only(PrincipalId(10), "nosecret")
    }

    fn authenticator_with(settings: WebApiSettings, rest: RestConfig) -> Authenticator {
        Authenticator::new(rest, ConfigStore::new(settings), Arc::new(directory()))
    }

    fn authenticator() -> Authenticator {
        authenticator_with(settings(true), RestConfig::default())
    }

    fn signed_target(
        path: &str,
        api_key: &str,
        method: &str,
        route: &str,
        private_key: &str,
        expires: i64,
    ) -> RestRequest {
        let signed = SignedRequest::sign(api_key, private_key.as_bytes(), method, route, expires);
        let mut url = url::Url::parse("http://example.com").unwrap();
        url.set_path(path);
        signed.append_to_url(&mut url);
        RestRequest::new(method, url.path(), url.query())
    }

    #[tokio::test]
    async fn test_concrete_scenario() {
        let auth = authenticator();
        let req = RestRequest::from_target(
            "GET",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=9999999999&signature=Qiu2MCOTX%2FJBpf5TwC8tKsL8Tn0%3D",
        );
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(42))
        );

        let expired = RestRequest::from_target(
            "GET",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=1&signature=Qiu2MCOTX%2FJBpf5TwC8tKsL8Tn0%3D",
        );
        let outcome = auth.authenticate_at(&expired, None, NOW).await;
        assert_eq!(outcome, AuthOutcome::Rejected(AuthError::invalid_signature()));
        if let AuthOutcome::Rejected(error) = outcome {
            assert_eq!(error.status, 401);
        }
    }

    #[tokio::test]
    async fn test_double_encoded_signature_is_accepted() {
        // The percent-encoded signature itself encoded once more on the wire.
        let auth = authenticator();
        let req = RestRequest::from_target(
            "GET",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=9999999999&signature=Qiu2MCOTX%252FJBpf5TwC8tKsL8Tn0%253D",
        );
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(42))
        );
    }

    #[tokio::test]
    async fn test_outside_namespace_is_untouched() {
        let auth = authenticator();
        let req = RestRequest::from_target(
            "GET",
            "/wp-json/wp/v2/posts?api_key=pk1&expires=1&signature=bogus",
        );
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::Unauthenticated
        );
    }

    #[tokio::test]
    async fn test_existing_principal_is_kept() {
        let auth = authenticator();
        let req = RestRequest::from_target(
            "GET",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=1&signature=bogus",
        );
        assert_eq!(
            auth.authenticate_at(&req, Some(PrincipalId(5)), NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(5))
        );
    }

    #[tokio::test]
    async fn test_missing_parameters_decline_silently() {
        let auth = authenticator();
        for target in [
            "/wp-json/gf/v2/entries",
            "/wp-json/gf/v2/entries?expires=9999999999&signature=x",
            "/wp-json/gf/v2/entries?api_key=pk1&signature=x",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=9999999999",
            "/wp-json/gf/v2/entries?api_key=&expires=9999999999&signature=x",
            "/wp-json/gf/v2/entries?api_key=0&expires=9999999999&signature=x",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=0&signature=x",
            "/wp-json/gf/v2/entries?api_key=pk1&expires=9999999999&signature=0",
        ] {
            let req = RestRequest::from_target("GET", target);
            assert_eq!(
                auth.authenticate_at(&req, None, NOW).await,
                AuthOutcome::Unauthenticated,
                "{target}"
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_rejects_valid_signature() {
        let auth = authenticator_with(settings(false), RestConfig::default());
        let req = signed_target("/wp-json/gf/v2/entries", "pk1", "GET", "entries", "secret", FAR_FUTURE);
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::Rejected(AuthError::invalid_api_key())
        );

        let req = signed_target("/wp-json/gf/v2/forms", "sys", "GET", "forms", "sys-secret", FAR_FUTURE);
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::Rejected(AuthError::invalid_api_key())
        );
    }

    #[tokio::test]
    async fn test_system_key_impersonates_account() {
        let auth = authenticator();
        let req = signed_target(
            "/wp-json/gf/v2/forms/1/submissions",
            "sys",
            "POST",
            "forms/1/submissions",
            "sys-secret",
            FAR_FUTURE,
        );
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(1))
        );
    }

    #[tokio::test]
    async fn test_user_key_resolves_to_user() {
        let auth = authenticator();
        let req = signed_target("/wp-json/gf/v2/forms/", "upk", "GET", "forms", "user-secret", FAR_FUTURE);
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(7))
        );
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let auth = authenticator();
        for (expires, ok) in [(NOW - 1, false), (NOW, false), (NOW + 1, true)] {
            let req = signed_target("/wp-json/gf/v2/entries", "pk1", "GET", "entries", "secret", expires);
            let outcome = auth.authenticate_at(&req, None, NOW).await;
            if ok {
                assert_eq!(outcome, AuthOutcome::AuthenticatedAs(PrincipalId(42)));
            } else {
                assert_eq!(outcome, AuthOutcome::Rejected(AuthError::invalid_signature()));
            }
        }
    }

    #[tokio::test]
    async fn test_tampering_invalidates() {
        let auth = authenticator();
        let signed = SignedRequest::sign("pk1", b"secret", "GET", "entries", FAR_FUTURE);
        let query = |api_key: &str, signature: &str| {
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("api_key", api_key)
                .append_pair("expires", &FAR_FUTURE.to_string())
                .append_pair("signature", signature)
                .finish()
        };

        let mut flipped = signed.signature.clone().into_bytes();
        flipped[0] = if flipped[0] == b'A' { b'B' } else { b'A' };
        let flipped = String::from_utf8(flipped).unwrap();

        let cases = [
            RestRequest::new("GET", "/wp-json/gf/v2/entries", Some(query("pk1", &flipped).as_str())),
            RestRequest::new("GET", "/wp-json/gf/v2/entriez", Some(query("pk1", &signed.signature).as_str())),
            RestRequest::new("PUT", "/wp-json/gf/v2/entries", Some(query("pk1", &signed.signature).as_str())),
        ];
        for req in cases {
            assert_eq!(
                auth.authenticate_at(&req, None, NOW).await,
                AuthOutcome::Rejected(AuthError::invalid_signature()),
                "{req:?}"
            );
        }

        // A different key that still resolves: user 7 cannot reuse user 42's signature.
        let req = RestRequest::new("GET", "/wp-json/gf/v2/entries", Some(query("upk", &signed.signature).as_str()));
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::Rejected(AuthError::invalid_signature())
        );
    }

    #[tokio::test]
    async fn test_method_case_does_not_matter() {
        let auth = authenticator();
        let req = signed_target("/wp-json/gf/v2/entries", "pk1", "get", "entries", "secret", FAR_FUTURE);
        assert_eq!(req.method(), "get");
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(42))
        );
    }

    #[tokio::test]
    async fn test_unknown_ambiguous_and_secretless_keys() {
        let auth = authenticator();
        for key in ["nobody", "dup", "nosecret"] {
            let req = signed_target("/wp-json/gf/v2/entries", key, "GET", "entries", "a", FAR_FUTURE);
            assert_eq!(
                auth.authenticate_at(&req, None, NOW).await,
                AuthOutcome::Rejected(AuthError::invalid_api_key()),
                "{key}"
            );
        }
    }

    #[tokio::test]
    async fn test_system_key_requires_secret_and_account() {
        let mut no_secret = settings(true);
        no_secret.private_key.clear();
        let auth = authenticator_with(no_secret, RestConfig::default());
        assert_eq!(auth.lookup_credential("sys").await, None);

        let mut no_account = settings(true);
        no_account.impersonate_account = None;
        let auth = authenticator_with(no_account, RestConfig::default());
        assert_eq!(auth.lookup_credential("sys").await, None);

        let mut zero_account = settings(true);
        zero_account.impersonate_account = Some(0);
        let auth = authenticator_with(zero_account, RestConfig::default());
        assert_eq!(auth.lookup_credential("sys").await, None);

        let auth = authenticator();
        let credential = auth.lookup_credential("sys").await.unwrap();
        assert_eq!(credential.principal_id, PrincipalId(1));
        assert_eq!(credential.private_key, "sys-secret");
    }

    #[tokio::test]
    async fn test_settings_reload_takes_effect() {
        let store = ConfigStore::new(settings(true));
        let auth = Authenticator::new(RestConfig::default(), store.clone(), Arc::new(directory()));
        assert!(auth.lookup_credential("pk1").await.is_some());

        store.update(settings(false)).await;
        assert!(auth.lookup_credential("pk1").await.is_none());
    }

    struct FailingDirectory;

    #[async_trait]
    impl UserDirectory for FailingDirectory {
        async fn find_users_by_public_key(
            &self,
            _public_key: &str,
            _limit: i64,
        ) -> Result<Vec<PrincipalId>, DirectoryError> {
            Err(DirectoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn private_key(&self, _user: PrincipalId) -> Result<Option<String>, DirectoryError> {
            Err(DirectoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_directory_failure_is_not_fatal() {
        let auth = Authenticator::new(
            RestConfig::default(),
            ConfigStore::new(settings(true)),
            Arc::new(FailingDirectory),
        );
        let req = signed_target("/wp-json/gf/v2/entries", "pk1", "GET", "entries", "secret", FAR_FUTURE);
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::Rejected(AuthError::invalid_api_key())
        );
    }

    #[test]
    fn test_route_derivation() {
        let auth = authenticator();
        let route = |path: &str| auth.route(&RestRequest::new("GET", path, None));
        assert_eq!(route("/wp-json/gf/v2/entries"), "entries");
        assert_eq!(route("/wp-json/gf/v2/entries/"), "entries");
        assert_eq!(route("/wp-json/gf/v2/forms/1/entries"), "forms/1/entries");

        let blog = authenticator_with(settings(true), RestConfig::new("wp-json", "/blog/"));
        let route = |path: &str| blog.route(&RestRequest::new("GET", path, None));
        assert_eq!(route("/blog/wp-json/gf/v2/forms/3"), "forms/3");
        // Outside the home path nothing is stripped before the namespace is removed.
        assert_eq!(route("/wp-json/gf/v2/forms/3"), "/forms/3");
    }

    #[tokio::test]
    async fn test_subdirectory_site() {
        let auth = authenticator_with(settings(true), RestConfig::new("wp-json", "blog"));
        let req = signed_target("/blog/wp-json/gf/v2/entries/", "pk1", "GET", "entries", "secret", FAR_FUTURE);
        assert_eq!(
            auth.authenticate_at(&req, None, NOW).await,
            AuthOutcome::AuthenticatedAs(PrincipalId(42))
        );
    }

    #[test]
    fn test_verify_signature_reports_invalid_signature() {
        let auth = authenticator();
        let req = signed_target("/wp-json/gf/v2/entries", "pk1", "GET", "entries", "secret", FAR_FUTURE);
        assert_eq!(auth.verify_signature(&req, "secret", NOW), Ok(()));
        assert_eq!(
            auth.verify_signature(&req, "wrong", NOW),
            Err(AuthError::invalid_signature())
        );
    }
}
