// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Error types for component construction and the admin surface.

use crate::catalog::Namespace;
use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Failure to turn a type name plus JSON arguments into a live component.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Requested type {namespace}.{type_name} is not recognized.")]
    UnknownType {
        namespace: Namespace,
        type_name: String,
    },

    #[error("Required parameter key \"{param}\" was not found in the request body.")]
    MissingRequiredParameter { type_name: String, param: String },

    #[error("Parameter \"{param}\" was passed with no value. Please check the request body and try again.")]
    EmptyRequiredValue { type_name: String, param: String },

    #[error("{kind} parameters are not supported (parameter \"{param}\" of {type_name}).")]
    UnsupportedValueKind {
        type_name: String,
        param: String,
        kind: &'static str,
    },

    #[error("{0}")]
    EmptyBatch(String),

    /// Validation failure raised by a constructor itself. Surfaced as-is.
    #[error("{message}")]
    Invalid { status: StatusCode, message: String },

    #[error("Unable to construct {type_name}: {source}")]
    ConstructionFailed {
        type_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BuildError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn construction_failed(type_name: &str, source: impl Into<anyhow::Error>) -> Self {
        let source: anyhow::Error = source.into();
        Self::ConstructionFailed {
            type_name: type_name.to_string(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Invalid { status, .. } => *status,
            Self::ConstructionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors returned by admin request handlers.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Required header \"{0}\" was not provided.")]
    MissingHeader(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("There is no active session with id \"{0}\".")]
    SessionNotFound(String),

    #[error("No admin action is registered at {0}.")]
    UnknownRoute(String),

    #[error("Method {0} is not allowed here.")]
    MethodNotAllowed(String),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl AdminError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) | Self::UnknownRoute(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Build(e) => e.status(),
        }
    }

    /// The single structured body every failed admin call answers with.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status: self.status().as_u16(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}
