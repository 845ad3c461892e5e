//! Named lifecycle stages.

use std::fmt;

/// One named point in the per-request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BeginRequest,
    ValidateRequest,
    AuthenticateRequest,
    AuthorizeRequest,
    MapRequest,
    PostMapRequest,
    /// Run on the claimed processor only; handlers never listen to it.
    ProcessRequest,
    EndRequest,
    /// Brackets a result's write to the response.
    PreExecuteResult,
    PostExecuteResult,
}

impl Stage {
    /// Stages emitted before the claimed processor runs, in order.
    pub const BEFORE_PROCESS: [Stage; 6] = [
        Stage::BeginRequest,
        Stage::ValidateRequest,
        Stage::AuthenticateRequest,
        Stage::AuthorizeRequest,
        Stage::MapRequest,
        Stage::PostMapRequest,
    ];

    /// Every stage a handler may listen to.
    pub const LISTENABLE: [Stage; 9] = [
        Stage::BeginRequest,
        Stage::ValidateRequest,
        Stage::AuthenticateRequest,
        Stage::AuthorizeRequest,
        Stage::MapRequest,
        Stage::PostMapRequest,
        Stage::EndRequest,
        Stage::PreExecuteResult,
        Stage::PostExecuteResult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::BeginRequest => "beginRequest",
            Stage::ValidateRequest => "validateRequest",
            Stage::AuthenticateRequest => "authenticateRequest",
            Stage::AuthorizeRequest => "authorizeRequest",
            Stage::MapRequest => "mapRequest",
            Stage::PostMapRequest => "postMapRequest",
            Stage::ProcessRequest => "processRequest",
            Stage::EndRequest => "endRequest",
            Stage::PreExecuteResult => "preExecuteResult",
            Stage::PostExecuteResult => "postExecuteResult",
        }
    }

    pub fn is_listenable(&self) -> bool {
        *self != Stage::ProcessRequest
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
