use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::tools::ToolId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl Plan {
    pub fn has_tool_access(self, tool: ToolId) -> bool {
        match self {
            Plan::Pro => true,
            Plan::Free => !tool.pro_only(),
        }
    }

    /// Maximum number of projects, `None` for unlimited
    pub fn project_limit(self) -> Option<u32> {
        match self {
            Plan::Free => Some(3),
            Plan::Pro => None,
        }
    }

    /// Maximum number of exports per month, `None` for unlimited
    pub fn export_limit(self) -> Option<u32> {
        match self {
            Plan::Free => Some(20),
            Plan::Pro => None,
        }
    }

    pub fn can_export(self, usage_count: u32) -> bool {
        self.export_limit().is_none_or(|limit| usage_count < limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub plan: Plan,
    pub projects_used: u32,
    pub exports_this_month: u32,
}

/// Who is editing, and what their plan allows
pub trait Identity {
    /// Fails with [`EditorError::Auth`] when nobody is signed in
    fn current_user(&self) -> EditorResult<UserProfile>;

    fn has_tool_access(&self, tool: ToolId) -> bool;

    fn can_export(&self, usage_count: u32) -> bool;

    /// Count one export against the user's monthly usage
    fn record_export(&self) -> LocalBoxFuture<'_, EditorResult<()>>;
}

/// Identity backed by a profile held in memory. Clones share the profile.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    user: Rc<RefCell<Option<UserProfile>>>,
}

impl LocalIdentity {
    pub fn signed_in(user: UserProfile) -> Self {
        Self {
            user: Rc::new(RefCell::new(Some(user))),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn set_plan(&self, plan: Plan) {
        if let Some(user) = self.user.borrow_mut().as_mut() {
            user.plan = plan;
        }
    }

    fn plan(&self) -> Option<Plan> {
        self.user.borrow().as_ref().map(|u| u.plan)
    }
}

impl Identity for LocalIdentity {
    fn current_user(&self) -> EditorResult<UserProfile> {
        self.user
            .borrow()
            .clone()
            .ok_or_else(|| EditorError::Auth("not authenticated".to_owned()))
    }

    fn has_tool_access(&self, tool: ToolId) -> bool {
        self.plan().is_some_and(|plan| plan.has_tool_access(tool))
    }

    fn can_export(&self, usage_count: u32) -> bool {
        self.plan().is_some_and(|plan| plan.can_export(usage_count))
    }

    fn record_export(&self) -> LocalBoxFuture<'_, EditorResult<()>> {
        async move {
            let mut user = self.user.borrow_mut();
            let user = user
                .as_mut()
                .ok_or_else(|| EditorError::Auth("not authenticated".to_owned()))?;
            user.exports_this_month += 1;
            Ok(())
        }
        .boxed_local()
    }
}
