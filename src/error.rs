use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use thiserror::Error;

use crate::notice::Notice;

pub const LOGIN_PATH: &str = "/login";

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("{0}")]
    SignInRequired(&'static str),

    #[error("You can only delete alerts that you created.")]
    PermissionDenied,

    #[error("That alert is no longer active.")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("Malformed payload")]
    MalformedPayload,

    #[error("{message}")]
    Backend {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ActionError {
    pub fn backend(message: &'static str, source: anyhow::Error) -> Self {
        ActionError::Backend { message, source }
    }

    pub fn notice(&self) -> Notice {
        match self {
            ActionError::PermissionDenied => Notice::error("Permission Denied", self.to_string()),
            ActionError::NotFound => Notice::error("Not Found", self.to_string()),
            _ => Notice::error("Error", self.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Unauthenticated => StatusCode::SEE_OTHER,
            ActionError::SignInRequired(_) => StatusCode::UNAUTHORIZED,
            ActionError::PermissionDenied => StatusCode::FORBIDDEN,
            ActionError::NotFound => StatusCode::NOT_FOUND,
            ActionError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ActionError::MalformedPayload => StatusCode::BAD_REQUEST,
            ActionError::Backend { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        if let ActionError::Unauthenticated = self {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        (self.status(), Json(self.notice())).into_response()
    }
}
