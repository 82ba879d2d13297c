//! Session cookie extraction

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::SET_COOKIE, request::Parts, HeaderValue},
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::{headers::Cookie, TypedHeader};
use std::convert::Infallible;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "stepcoach_session";

/// The caller's session id, minted when the request carries none
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: String,
    is_new: bool,
}

impl SessionHandle {
    fn from_cookie(cookie: Option<&Cookie>) -> Self {
        let existing = cookie
            .and_then(|c| c.get(SESSION_COOKIE))
            .and_then(|value| Uuid::parse_str(value).ok());
        match existing {
            Some(id) => Self {
                id: id.to_string(),
                is_new: false,
            },
            None => Self {
                id: Uuid::new_v4().to_string(),
                is_new: true,
            },
        }
    }

    fn set_cookie_value(&self) -> String {
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionHandle {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookie = TypedHeader::<Cookie>::from_request_parts(parts, state)
            .await
            .ok();
        Ok(Self::from_cookie(cookie.as_ref().map(|TypedHeader(c)| c)))
    }
}

/// Sets the cookie on the response only for freshly minted sessions
impl IntoResponseParts for SessionHandle {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.is_new {
            match HeaderValue::from_str(&self.set_cookie_value()) {
                Ok(value) => {
                    res.headers_mut().insert(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(error = %e, "Could not encode session cookie"),
            }
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, Request};

    async fn extract(cookie: Option<&str>) -> SessionHandle {
        let mut builder = Request::builder().uri("/progress");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        SessionHandle::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_valid_cookie_is_reused() {
        let id = Uuid::new_v4().to_string();
        let handle = extract(Some(&format!("theme=dark; {SESSION_COOKIE}={id}"))).await;
        assert_eq!(handle.id, id);
        assert!(!handle.is_new);
    }

    #[tokio::test]
    async fn test_missing_or_forged_cookie_mints_new_session() {
        let handle = extract(None).await;
        assert!(handle.is_new);
        assert!(Uuid::parse_str(&handle.id).is_ok());

        let forged = extract(Some(&format!("{SESSION_COOKIE}=../../etc/passwd"))).await;
        assert!(forged.is_new);
        assert_ne!(forged.id, "../../etc/passwd");
    }

    #[test]
    fn test_cookie_attributes() {
        let handle = SessionHandle::from_cookie(None);
        let value = handle.set_cookie_value();
        assert!(value.starts_with(&format!("{SESSION_COOKIE}={}", handle.id)));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
    }
}
