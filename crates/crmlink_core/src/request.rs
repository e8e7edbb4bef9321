//! Typed requests for operations outside plain CRUD.

use crate::id::RecordId;
use crate::typed::EntityReference;

/// A typed request executed by the remote bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Identify the calling user.
    WhoAmI,
    /// Change the owner of a record.
    Assign {
        /// Record to reassign.
        target: EntityReference,
        /// New owner, a user or a team.
        assignee: EntityReference,
    },
    /// Move a record to another state.
    SetState {
        /// Record to update.
        entity: EntityReference,
        /// New state code.
        state: i32,
        /// New status reason code.
        status: i32,
    },
}

impl Request {
    /// Name of the platform message.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WhoAmI => "WhoAmI",
            Self::Assign { .. } => "Assign",
            Self::SetState { .. } => "SetState",
        }
    }
}

/// Identity of the calling user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhoAmI {
    /// User id.
    pub user_id: RecordId,
    /// Business unit of the user.
    pub business_unit_id: RecordId,
    /// Organization id.
    pub organization_id: RecordId,
}

/// Response to a typed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Answer to [`Request::WhoAmI`].
    WhoAmI(WhoAmI),
    /// The request succeeded and returns nothing.
    Empty,
}
