use crate::dispatch::dispatcher::DispatchReceipt;
use crate::foundation::error::RenderResult;
use crate::layout::engine::StoredLayout;

/// Status reported for one layout or dispatch request.
///
/// Expected conditions (missing identifiers, nothing to render) become `ok: false` with a
/// message; anything else stays an error for the caller.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Key of the written definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(flatten)]
    pub receipt: Option<DispatchReceipt>,
}

impl ActionResponse {
    fn not_ok(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            key: None,
            receipt: None,
        }
    }

    /// Report a layout run.
    pub fn from_layout(result: RenderResult<StoredLayout>) -> RenderResult<Self> {
        match result {
            Ok(StoredLayout::Written { key, .. }) => Ok(Self {
                ok: true,
                message: None,
                key: Some(key),
                receipt: None,
            }),
            Ok(StoredLayout::NothingToDo) => Ok(Self::not_ok("nothing to do")),
            Err(e) if e.is_expected() => Ok(Self::not_ok(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Report a dispatch.
    pub fn from_dispatch(result: RenderResult<DispatchReceipt>) -> RenderResult<Self> {
        match result {
            Ok(receipt) => Ok(Self {
                ok: true,
                message: Some("spawned children".to_string()),
                key: None,
                receipt: Some(receipt),
            }),
            Err(e) if e.is_expected() => Ok(Self::not_ok(e.to_string())),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/response.rs"]
mod tests;
