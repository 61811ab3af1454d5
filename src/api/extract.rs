// Extractors whose rejections render as `{"detail": ...}`

use crate::db::schema::Page;
use crate::errors::{AppError, Result};
use crate::rate_limit::RequestContext;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use serde::Deserialize;
use std::convert::Infallible;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct ApiForm<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Caller address as the rate limiters see it
#[derive(Debug, Clone)]
pub struct ClientAddress(pub String);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientAddress {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(ClientAddress(RequestContext::from_parts(parts).client_address()))
    }
}

/// `?skip=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn page(self) -> Result<Page> {
        let defaults = Page::default();
        let page = Page {
            skip: self.skip.unwrap_or(defaults.skip),
            limit: self.limit.unwrap_or(defaults.limit),
        };

        if page.skip < 0 || page.limit < 0 {
            return Err(AppError::InvalidInput(
                "skip and limit must not be negative".to_string(),
            ));
        }

        Ok(page)
    }
}
