use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Res};

/// Role of an uploaded image in a face-swap job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    #[default]
    Source,
    Target,
    Result,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Source => "source",
            UploadKind::Target => "target",
            UploadKind::Result => "result",
        }
    }

    pub fn from_str(s: &str) -> Res<Self> {
        match s {
            "source" => Ok(UploadKind::Source),
            "target" => Ok(UploadKind::Target),
            "result" => Ok(UploadKind::Result),
            other => Err(AppError::BadRequest(format!(
                "Invalid upload kind: {}. Expected source, target or result",
                other
            ))),
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditTransactionKind {
    Purchase,
    Usage,
    Grant,
}

impl fmt::Display for CreditTransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditTransactionKind::Purchase => f.write_str("purchase"),
            CreditTransactionKind::Usage => f.write_str("usage"),
            CreditTransactionKind::Grant => f.write_str("grant"),
        }
    }
}

/// Accepts only absolute http(s) URLs, used for redirect targets handed to Stripe.
pub fn validate_redirect_url(field: &str, value: &str) -> Res<()> {
    let valid = url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "{} must be an absolute http(s) URL",
            field
        )))
    }
}
