/// Server-driven table projection for the user list
///
/// This module is the pure half of the user listing: it parses and clamps the
/// table query a client sends (draw counter, offset, page size, search term,
/// sort spec) and projects `UserWithRoles` rows into the structured shape the
/// table renders: role badges, status badge, toggle affordance, and the
/// per-viewer action set computed from the authorization policy. The SQL half
/// lives in [`crate::models::user::User::list_page`].
///
/// Rendering is out of scope: rows carry structured fields (role list,
/// status enum, affordance flags), never markup.
///
/// # Example
///
/// ```
/// use userdesk_shared::listing::{SortColumn, SortDir, TableQuery};
///
/// let query = TableQuery {
///     draw: 3,
///     start: 20,
///     length: Some(10),
///     search: Some("ali".to_string()),
///     order: None,
/// };
///
/// assert_eq!(query.page_size(), 10);
/// assert_eq!(query.sort(), (SortColumn::Id, SortDir::Desc));
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::policy::{row_actions, Actor, RowActions, TargetUser};
use crate::models::user::UserWithRoles;

/// Page size for the interactive table when the client sends none
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Server-enforced upper bound on the page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Page size of the server-rendered index view
pub const INDEX_PAGE_SIZE: i64 = 3;

/// Columns the user list may be sorted by
///
/// A whitelist: the ORDER BY clause is built from this enum, never from raw
/// client input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    /// Creation order (the default; descending = most recent first)
    #[default]
    Id,
    Name,
    Email,
    Status,
    CreatedAt,
}

impl SortColumn {
    /// SQL expression this column sorts by
    pub fn order_expr(&self) -> &'static str {
        match self {
            SortColumn::Id => "u.id",
            SortColumn::Name => "u.name",
            SortColumn::Email => "u.email",
            SortColumn::Status => "u.status",
            SortColumn::CreatedAt => "u.created_at",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    /// Default: newest first
    #[default]
    Desc,
}

impl SortDir {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Sort specification: column plus direction
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderSpec {
    /// Column to sort by
    pub column: SortColumn,

    /// Direction (defaults to descending)
    #[serde(default)]
    pub dir: SortDir,
}

/// Query the interactive table posts for each page draw
///
/// All fields are optional on the wire; missing values fall back to a full
/// default page. The `draw` counter is echoed back verbatim so the client can
/// discard out-of-order responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    /// Client-side draw counter, echoed in the response
    #[serde(default)]
    pub draw: u64,

    /// Row offset of the requested page
    #[serde(default)]
    pub start: i64,

    /// Requested page size; clamped server-side
    #[serde(default)]
    pub length: Option<i64>,

    /// Free-text search matched against name and email
    #[serde(default)]
    pub search: Option<String>,

    /// Sort specification; defaults to newest first
    #[serde(default)]
    pub order: Option<OrderSpec>,
}

impl TableQuery {
    /// Effective page size: requested length clamped to [1, MAX_PAGE_SIZE]
    ///
    /// Missing or non-positive lengths fall back to [`DEFAULT_PAGE_SIZE`].
    pub fn page_size(&self) -> i64 {
        match self.length {
            Some(n) if n > 0 => n.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Effective row offset (never negative)
    pub fn offset(&self) -> i64 {
        self.start.max(0)
    }

    /// The search term, trimmed; `None` when empty
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Effective sort column and direction
    pub fn sort(&self) -> (SortColumn, SortDir) {
        let order = self.order.unwrap_or_default();
        (order.column, order.dir)
    }
}

/// Status badge of a listed user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBadge {
    Active,
    Inactive,
}

impl StatusBadge {
    /// Badge for an active flag
    pub fn from_active(active: bool) -> Self {
        if active {
            StatusBadge::Active
        } else {
            StatusBadge::Inactive
        }
    }
}

/// Label of the toggle-status affordance
///
/// Names the action the toggle will perform, so an active user's button says
/// "Inactivate" and an inactive user's says "Activate".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleLabel {
    Activate,
    Inactivate,
}

/// Toggle-status affordance for one row
///
/// Disabled for Super Admin rows; the endpoint itself still permits
/// reactivating an inactive Super Admin, but the table never offers the
/// toggle for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleAffordance {
    /// Whether the toggle may be offered at all
    pub enabled: bool,

    /// The action the toggle would perform
    pub label: ToggleLabel,
}

/// One projected row of the user table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    /// 1-based position within the current sort, monotonic across pages
    pub index: i64,

    /// User ID (row identity; stable under re-sorting)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Role badge names; empty = the explicit "no role" state
    pub roles: Vec<String>,

    /// Status badge
    pub status: StatusBadge,

    /// Toggle-status affordance
    pub toggle: ToggleAffordance,

    /// Actions this viewer may take on the row
    pub actions: RowActions,
}

/// One response page of the interactive table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePage {
    /// Echo of the request's draw counter
    pub draw: u64,

    /// Total rows before filtering
    #[serde(rename = "recordsTotal")]
    pub records_total: i64,

    /// Rows matching the search term
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: i64,

    /// The projected rows, in sort order
    pub data: Vec<UserRow>,
}

/// Projects one user into a table row for the given viewer
///
/// `index` is the 1-based position of the row in the current sort.
pub fn project_row(actor: &Actor, user: &UserWithRoles, index: i64) -> UserRow {
    let target = TargetUser::of(user);

    UserRow {
        index,
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        roles: user.roles.clone(),
        status: StatusBadge::from_active(user.status),
        toggle: ToggleAffordance {
            enabled: !target.super_admin,
            label: if user.status {
                ToggleLabel::Inactivate
            } else {
                ToggleLabel::Activate
            },
        },
        actions: row_actions(actor, &target),
    }
}

/// Projects a page of users, numbering rows from `start + 1`
pub fn project_rows(actor: &Actor, users: &[UserWithRoles], start: i64) -> Vec<UserRow> {
    users
        .iter()
        .enumerate()
        .map(|(i, user)| project_row(actor, user, start + i as i64 + 1))
        .collect()
}
