//! Back-office access gate.
//!
//! Evaluated in order, first match wins:
//! 1. Auth state unresolved → Loading (no decision yet)
//! 2. No user → redirect to the staff login, remembering the requested path
//! 3. User without any staff role → AccessDenied
//! 4. Staff, page requires roles, none held → InsufficientPermissions
//! 5. Otherwise → Allow
//!
//! Which roles a page needs is static data in [`Page::required_roles`].

use serde::Serialize;
use uuid::Uuid;

use crate::config::STAFF_LOGIN_PATH;
use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// Role sets
// ═══════════════════════════════════════════════════════════

/// Set of staff roles as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().copied().collect()
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    pub fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn intersects(self, other: RoleSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Holding any recognised role makes a user staff.
    pub fn is_staff(self) -> bool {
        !self.is_empty()
    }

    pub fn roles(self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| self.contains(*r)).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::EMPTY;
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.roles().serialize(serializer)
    }
}

// ═══════════════════════════════════════════════════════════
// Page capability table
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Appointments,
    Patients,
    Calendar,
    Staff,
    Services,
    Gallery,
    Settings,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Self::Dashboard,
        Self::Appointments,
        Self::Patients,
        Self::Calendar,
        Self::Staff,
        Self::Services,
        Self::Gallery,
        Self::Settings,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/admin/dashboard",
            Self::Appointments => "/admin/appointments",
            Self::Patients => "/admin/patients",
            Self::Calendar => "/admin/calendar",
            Self::Staff => "/admin/staff",
            Self::Services => "/admin/services",
            Self::Gallery => "/admin/gallery",
            Self::Settings => "/admin/settings",
        }
    }

    /// Roles of which the user must hold at least one. Empty means any staff
    /// role will do.
    pub fn required_roles(self) -> RoleSet {
        match self {
            Self::Dashboard | Self::Appointments | Self::Patients | Self::Calendar => RoleSet::EMPTY,
            Self::Staff | Self::Services | Self::Gallery | Self::Settings => {
                RoleSet::of(&[Role::SuperAdmin])
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Gate
// ═══════════════════════════════════════════════════════════

/// What is known about the requesting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Anonymous,
    SignedIn { user_id: Uuid, roles: RoleSet },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GateOutcome {
    Loading,
    RedirectToLogin { login_path: String, return_to: String },
    AccessDenied,
    InsufficientPermissions { required: RoleSet },
    Allow,
}

impl GateOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `auth` may open a page needing `required` roles.
pub fn gate(auth: &AuthState, required: RoleSet, requested_path: &str) -> GateOutcome {
    match auth {
        AuthState::Loading => GateOutcome::Loading,
        AuthState::Anonymous => GateOutcome::RedirectToLogin {
            login_path: STAFF_LOGIN_PATH.to_string(),
            return_to: requested_path.to_string(),
        },
        AuthState::SignedIn { roles, .. } if !roles.is_staff() => GateOutcome::AccessDenied,
        AuthState::SignedIn { roles, .. } if !required.is_empty() && !roles.intersects(required) => {
            GateOutcome::InsufficientPermissions { required }
        }
        AuthState::SignedIn { .. } => GateOutcome::Allow,
    }
}

pub fn gate_page(auth: &AuthState, page: Page) -> GateOutcome {
    gate(auth, page.required_roles(), page.path())
}

// ═══════════════════════════════════════════════════════════
// Sidebar navigation
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub page: Page,
    pub path: &'static str,
    /// Shown when the user holds any of these.
    pub roles: RoleSet,
}

const ALL_STAFF: RoleSet = RoleSet(0b1111);
const CLINICAL: RoleSet = RoleSet(0b0111); // super_admin, receptionist, dentist
const ADMIN_ONLY: RoleSet = RoleSet(0b0001);

const NAV_ITEMS: [NavItem; 7] = [
    NavItem { label: "Dashboard", page: Page::Dashboard, path: "/admin/dashboard", roles: ALL_STAFF },
    NavItem { label: "Appointments", page: Page::Appointments, path: "/admin/appointments", roles: CLINICAL },
    NavItem { label: "Patients", page: Page::Patients, path: "/admin/patients", roles: CLINICAL },
    NavItem { label: "Staff", page: Page::Staff, path: "/admin/staff", roles: ADMIN_ONLY },
    NavItem { label: "Services", page: Page::Services, path: "/admin/services", roles: ADMIN_ONLY },
    NavItem { label: "Gallery", page: Page::Gallery, path: "/admin/gallery", roles: ADMIN_ONLY },
    NavItem { label: "Settings", page: Page::Settings, path: "/admin/settings", roles: ADMIN_ONLY },
];

/// Sidebar entries visible to a role set, in display order.
pub fn navigation_for(roles: RoleSet) -> Vec<NavItem> {
    NAV_ITEMS
        .iter()
        .filter(|item| roles.intersects(item.roles))
        .copied()
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(roles: &[Role]) -> AuthState {
        AuthState::SignedIn {
            user_id: Uuid::new_v4(),
            roles: RoleSet::of(roles),
        }
    }

    #[test]
    fn role_set_membership() {
        let set = RoleSet::of(&[Role::Dentist, Role::Accountant]);
        assert!(set.contains(Role::Dentist));
        assert!(!set.contains(Role::SuperAdmin));
        assert!(set.intersects(RoleSet::of(&[Role::Accountant, Role::SuperAdmin])));
        assert!(!set.intersects(RoleSet::EMPTY));
        assert_eq!(set.roles(), vec![Role::Dentist, Role::Accountant]);
    }

    #[test]
    fn role_set_serializes_as_names() {
        let json = serde_json::to_string(&RoleSet::of(&[Role::SuperAdmin])).unwrap();
        assert_eq!(json, r#"["super_admin"]"#);
    }

    #[test]
    fn loading_wins_regardless_of_everything_else() {
        for page in Page::ALL {
            assert_eq!(gate_page(&AuthState::Loading, page), GateOutcome::Loading);
        }
    }

    #[test]
    fn anonymous_redirects_with_return_path() {
        let outcome = gate(&AuthState::Anonymous, RoleSet::EMPTY, "/admin/calendar?view=week");
        assert_eq!(
            outcome,
            GateOutcome::RedirectToLogin {
                login_path: "/admin".into(),
                return_to: "/admin/calendar?view=week".into(),
            }
        );
    }

    #[test]
    fn user_without_roles_is_denied_not_redirected() {
        let outcome = gate_page(&signed_in(&[]), Page::Dashboard);
        assert_eq!(outcome, GateOutcome::AccessDenied);
    }

    #[test]
    fn dentist_on_staff_page_lacks_permissions() {
        let dentist = signed_in(&[Role::Dentist]);
        assert!(matches!(
            gate_page(&dentist, Page::Staff),
            GateOutcome::InsufficientPermissions { .. }
        ));
        assert_eq!(gate_page(&dentist, Page::Dashboard), GateOutcome::Allow);
    }

    #[test]
    fn insufficient_is_distinct_from_denied() {
        let receptionist = signed_in(&[Role::Receptionist]);
        let nobody = signed_in(&[]);
        assert_ne!(
            gate_page(&receptionist, Page::Settings),
            gate_page(&nobody, Page::Settings)
        );
    }

    #[test]
    fn super_admin_reaches_every_page() {
        let admin = signed_in(&[Role::SuperAdmin]);
        for page in Page::ALL {
            assert!(gate_page(&admin, page).is_allowed(), "{page:?}");
        }
    }

    #[test]
    fn any_staff_role_opens_open_pages() {
        for role in Role::ALL {
            let user = signed_in(&[role]);
            for page in [Page::Dashboard, Page::Appointments, Page::Patients, Page::Calendar] {
                assert!(gate_page(&user, page).is_allowed());
            }
        }
    }

    #[test]
    fn sidebar_filters_by_role() {
        let labels = |roles: &[Role]| -> Vec<&'static str> {
            navigation_for(RoleSet::of(roles)).iter().map(|i| i.label).collect()
        };
        assert_eq!(labels(&[Role::Accountant]), vec!["Dashboard"]);
        assert_eq!(
            labels(&[Role::Dentist]),
            vec!["Dashboard", "Appointments", "Patients"]
        );
        assert_eq!(labels(&[Role::SuperAdmin]).len(), 7);
        assert!(labels(&[]).is_empty());
    }

    #[test]
    fn nav_paths_match_page_table() {
        for item in navigation_for(RoleSet::of(&Role::ALL)) {
            assert_eq!(item.path, item.page.path());
        }
    }
}
