mod approval;
mod event;
mod playbook;
mod workflow;

pub use approval::{Approval, ApprovalStatus};
pub use event::{EventContext, SecurityEvent, Severity};
pub use playbook::{ActionKind, ActionSpec, Playbook};
pub use workflow::{ActionResult, ExecutedAction, Workflow, WorkflowStatus};
