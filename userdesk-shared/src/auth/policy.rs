/// Authorization policy for user management
///
/// This module decides, for a given actor and target user, which of the
/// user-management actions are permitted. It is the single place where the
/// "Super Admin" role name is treated as a sentinel.
///
/// # Model
///
/// The actor is a capability snapshot (id plus role-name and
/// permission-name sets) loaded fresh from the store once per request (no
/// caching across requests, so a concurrent role change takes effect on the
/// next request). Every decision is then a pure, side-effect-free set lookup.
///
/// # Rules, in precedence order
///
/// 1. Route-level gate: the actor must hold the permission matching the
///    action family ([`UserAction::required_permissions`]).
/// 2. A "Super Admin" target may only be edited by an actor who also holds
///    "Super Admin", regardless of the `edit-user` permission.
/// 3. Delete is denied unconditionally for "Super Admin" targets and for the
///    actor's own account.
/// 4. An active "Super Admin" may not be deactivated; this is a soft notice,
///    not an authorization error, and reactivation stays allowed.
/// 5. The list is visible to anyone passing rule 1; rules 2-4 only shape the
///    per-row affordances.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use userdesk_shared::auth::policy::{
///     require_action, Actor, UserAction, EDIT_USER,
/// };
/// use uuid::Uuid;
///
/// let actor = Actor {
///     id: Uuid::new_v4(),
///     roles: HashSet::new(),
///     permissions: HashSet::from([EDIT_USER.to_string()]),
/// };
///
/// assert!(require_action(&actor, UserAction::Edit).is_ok());
/// assert!(require_action(&actor, UserAction::Create).is_err());
/// ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::role::{Permission, Role};
use crate::models::user::UserWithRoles;

/// The sentinel role name with hard-coded protections
pub const SUPER_ADMIN: &str = "Super Admin";

/// Permission gating user creation
pub const CREATE_USER: &str = "create-user";

/// Permission gating user edit/update
pub const EDIT_USER: &str = "edit-user";

/// Permission gating user deletion
pub const DELETE_USER: &str = "delete-user";

/// Message returned with every hard authorization denial
pub const PERMISSION_DENIED: &str = "USER DOES NOT HAVE THE RIGHT PERMISSIONS";

/// Notice returned when a Super Admin deactivation is blocked (soft denial)
pub const SUPER_ADMIN_TOGGLE_NOTICE: &str = "You cannot deactivate a Super Admin user.";

/// Hard authorization denial (HTTP 403)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", PERMISSION_DENIED)]
pub struct AccessDenied;

/// Soft policy denial: the action is blocked with user-facing guidance, not
/// an error status
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", SUPER_ADMIN_TOGGLE_NOTICE)]
pub struct ToggleBlocked;

/// The user-management actions the policy rules on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// View the listing or a single user
    List,
    /// Create a new user
    Create,
    /// Edit/update an existing user
    Edit,
    /// Delete a user
    Delete,
    /// Flip a user's active status
    ToggleStatus,
}

impl UserAction {
    /// Permissions satisfying the route-level gate for this action
    ///
    /// Holding ANY of the returned permissions passes the gate. Toggle-status
    /// carries no permission requirement beyond authentication; rule 4 is its
    /// only guard.
    pub fn required_permissions(&self) -> &'static [&'static str] {
        match self {
            UserAction::List => &[CREATE_USER, EDIT_USER, DELETE_USER],
            UserAction::Create => &[CREATE_USER],
            UserAction::Edit => &[EDIT_USER],
            UserAction::Delete => &[DELETE_USER],
            UserAction::ToggleStatus => &[],
        }
    }
}

/// Capability snapshot of the authenticated requester
///
/// Loaded once per request via [`Actor::load`]; all policy checks against it
/// are O(1) set lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// The requester's user ID
    pub id: Uuid,

    /// Names of the roles the requester holds
    pub roles: HashSet<String>,

    /// Names of the permissions granted through those roles
    pub permissions: HashSet<String>,
}

impl Actor {
    /// Loads the capability snapshot for a user, fresh from the store
    ///
    /// Called by the authentication middleware on every request so that
    /// decisions never act on stale role or permission state.
    pub async fn load(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let roles = Role::names_for_user(pool, user_id).await?;
        let permissions = Permission::names_for_user(pool, user_id).await?;

        Ok(Self {
            id: user_id,
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        })
    }

    /// Whether the actor holds the named role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Whether the actor holds the named permission
    pub fn can(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the actor holds any of the named permissions
    pub fn can_any(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.can(p))
    }

    /// Whether the actor holds the Super Admin sentinel role
    pub fn is_super_admin(&self) -> bool {
        self.has_role(SUPER_ADMIN)
    }
}

/// Snapshot of the user record being acted upon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetUser {
    /// The target's user ID
    pub id: Uuid,

    /// Whether the target holds the Super Admin role
    pub super_admin: bool,

    /// The target's current active status
    pub active: bool,
}

impl TargetUser {
    /// Builds the policy snapshot from a loaded user
    pub fn of(user: &UserWithRoles) -> Self {
        Self {
            id: user.id,
            super_admin: user.has_role(SUPER_ADMIN),
            active: user.status,
        }
    }
}

/// Rule 1: the route-level permission gate
///
/// # Errors
///
/// [`AccessDenied`] if the actor holds none of the action's permissions.
pub fn require_action(actor: &Actor, action: UserAction) -> Result<(), AccessDenied> {
    let required = action.required_permissions();

    if required.is_empty() || actor.can_any(required) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// Rules 1 + 2: may the actor edit this target?
///
/// A "Super Admin" target is only editable by an actor who also holds
/// "Super Admin"; the `edit-user` permission alone is not enough.
pub fn require_edit(actor: &Actor, target: &TargetUser) -> Result<(), AccessDenied> {
    require_action(actor, UserAction::Edit)?;

    if target.super_admin && !actor.is_super_admin() {
        return Err(AccessDenied);
    }

    Ok(())
}

/// Rules 1 + 3: may the actor delete this target?
///
/// Denied unconditionally for "Super Admin" targets and for self-deletion,
/// even when the actor is a Super Admin.
pub fn require_delete(actor: &Actor, target: &TargetUser) -> Result<(), AccessDenied> {
    require_action(actor, UserAction::Delete)?;

    if target.super_admin || target.id == actor.id {
        return Err(AccessDenied);
    }

    Ok(())
}

/// Rule 4: may this target's status be toggled right now?
///
/// Blocks deactivating an active "Super Admin" with a soft notice. An
/// inactive Super Admin may still be reactivated through this path.
pub fn check_toggle(target: &TargetUser) -> Result<(), ToggleBlocked> {
    if target.super_admin && target.active {
        return Err(ToggleBlocked);
    }

    Ok(())
}

/// Actions the viewer may take on a listed row
///
/// `view` is always offered to anyone who can see the list; `edit` and
/// `delete` apply rules 2 and 3 for this particular viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowActions {
    /// Show the target's detail page
    pub view: bool,

    /// Edit the target
    pub edit: bool,

    /// Delete the target
    pub delete: bool,
}

/// Computes the per-row action set for a viewer (rule 5)
pub fn row_actions(actor: &Actor, target: &TargetUser) -> RowActions {
    RowActions {
        view: true,
        edit: require_edit(actor, target).is_ok(),
        delete: require_delete(actor, target).is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: &[&str], permissions: &[&str]) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn target(super_admin: bool, active: bool) -> TargetUser {
        TargetUser {
            id: Uuid::new_v4(),
            super_admin,
            active,
        }
    }

    #[test]
    fn test_route_gate_requires_matching_permission() {
        let creator = actor(&[], &[CREATE_USER]);

        assert!(require_action(&creator, UserAction::Create).is_ok());
        assert!(require_action(&creator, UserAction::Edit).is_err());
        assert!(require_action(&creator, UserAction::Delete).is_err());
    }

    #[test]
    fn test_list_gate_accepts_any_management_permission() {
        for permission in [CREATE_USER, EDIT_USER, DELETE_USER] {
            let viewer = actor(&[], &[permission]);
            assert!(require_action(&viewer, UserAction::List).is_ok());
        }

        let outsider = actor(&["Editor"], &[]);
        assert!(require_action(&outsider, UserAction::List).is_err());
    }

    #[test]
    fn test_toggle_has_no_permission_gate() {
        let outsider = actor(&[], &[]);
        assert!(require_action(&outsider, UserAction::ToggleStatus).is_ok());
    }

    #[test]
    fn test_editor_may_edit_regular_target() {
        let editor = actor(&["Editor"], &[EDIT_USER]);
        assert!(require_edit(&editor, &target(false, true)).is_ok());
    }

    #[test]
    fn test_super_admin_target_requires_super_admin_actor() {
        let editor = actor(&["Editor"], &[EDIT_USER]);
        let super_admin = actor(&[SUPER_ADMIN], &[EDIT_USER]);
        let protected = target(true, true);

        assert_eq!(require_edit(&editor, &protected), Err(AccessDenied));
        assert!(require_edit(&super_admin, &protected).is_ok());
    }

    #[test]
    fn test_edit_denied_without_permission_even_for_super_admin() {
        // Rule 1 runs before rule 2: the sentinel role does not bypass the
        // permission gate on its own.
        let roleless = actor(&[SUPER_ADMIN], &[]);
        assert!(require_edit(&roleless, &target(false, true)).is_err());
    }

    #[test]
    fn test_delete_denied_for_super_admin_target() {
        let deleter = actor(&[], &[DELETE_USER]);
        assert_eq!(require_delete(&deleter, &target(true, true)), Err(AccessDenied));
        assert_eq!(require_delete(&deleter, &target(true, false)), Err(AccessDenied));
    }

    #[test]
    fn test_delete_denied_for_own_account_regardless_of_role() {
        let deleter = actor(&[SUPER_ADMIN], &[DELETE_USER]);
        let own = TargetUser {
            id: deleter.id,
            super_admin: false,
            active: true,
        };

        assert_eq!(require_delete(&deleter, &own), Err(AccessDenied));
    }

    #[test]
    fn test_delete_allowed_for_regular_target() {
        let deleter = actor(&[], &[DELETE_USER]);
        assert!(require_delete(&deleter, &target(false, false)).is_ok());
    }

    #[test]
    fn test_toggle_blocked_only_for_active_super_admin() {
        assert_eq!(check_toggle(&target(true, true)), Err(ToggleBlocked));

        // Reactivation of an inactive Super Admin stays allowed.
        assert!(check_toggle(&target(true, false)).is_ok());
        assert!(check_toggle(&target(false, true)).is_ok());
        assert!(check_toggle(&target(false, false)).is_ok());
    }

    #[test]
    fn test_row_actions_for_editor_viewer() {
        let editor = actor(&["Editor"], &[EDIT_USER]);

        let regular = row_actions(&editor, &target(false, true));
        assert!(regular.view);
        assert!(regular.edit);
        assert!(!regular.delete);

        let protected = row_actions(&editor, &target(true, true));
        assert!(protected.view);
        assert!(!protected.edit);
        assert!(!protected.delete);
    }

    #[test]
    fn test_row_actions_never_offer_self_delete() {
        let admin = actor(&[SUPER_ADMIN], &[CREATE_USER, EDIT_USER, DELETE_USER]);
        let own = TargetUser {
            id: admin.id,
            super_admin: true,
            active: true,
        };

        let actions = row_actions(&admin, &own);
        assert!(actions.edit);
        assert!(!actions.delete);
    }

    #[test]
    fn test_denial_messages_are_fixed() {
        assert_eq!(AccessDenied.to_string(), PERMISSION_DENIED);
        assert_eq!(ToggleBlocked.to_string(), SUPER_ADMIN_TOGGLE_NOTICE);
    }
}
