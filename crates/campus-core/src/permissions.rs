//! Role permission tables and user-management predicates.
//!
//! Every function here is a pure lookup. Role arguments are plain strings
//! because they usually come straight from a request header or form field;
//! anything that does not parse as a [`Role`] is treated as having no rights.

use crate::enums::Role;

const ADMIN_PERMISSIONS: &[&str] = &[
    "create_user",
    "update_user",
    "delete_user",
    "view_all_users",
    "manage_courses",
    "manage_batches",
];

const TRAINER_PERMISSIONS: &[&str] = &[
    "view_students",
    "manage_sessions",
    "view_materials",
    "update_profile",
];

const STUDENT_PERMISSIONS: &[&str] = &[
    "view_courses",
    "enroll_course",
    "view_materials",
    "update_profile",
    "view_progress",
];

/// Actions granted to `role`.
#[must_use]
pub const fn permissions_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Trainer => TRAINER_PERMISSIONS,
        Role::Student => STUDENT_PERMISSIONS,
    }
}

/// Whether `role` may perform `action`. Unknown roles and actions are denied.
#[must_use]
pub fn has_permission(role: &str, action: &str) -> bool {
    role.parse::<Role>()
        .is_ok_and(|role| permissions_for(role).contains(&action))
}

/// Whether a user with `current_role` may change a `target_role` user's role
/// to `new_role`. Admins can change anyone but other admins.
#[must_use]
pub fn can_update_role(current_role: &str, target_role: &str, new_role: &str) -> bool {
    current_role == Role::Admin.as_str()
        && target_role != Role::Admin.as_str()
        && new_role.parse::<Role>().is_ok()
}

/// Whether `current_id` may delete `target_id`. Admins cannot delete
/// themselves or other admins.
#[must_use]
pub fn can_delete_user(
    current_role: &str,
    target_role: &str,
    current_id: &str,
    target_id: &str,
) -> bool {
    current_role == Role::Admin.as_str()
        && current_id != target_id
        && target_role != Role::Admin.as_str()
}

/// Route gate: admin passes everything, any other role must match exactly.
#[must_use]
pub fn authorize(required: Role, role: Role) -> bool {
    role == Role::Admin || role == required
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", "create_user", true)]
    #[case("admin", "manage_batches", true)]
    #[case("admin", "view_materials", false)]
    #[case("trainer", "manage_sessions", true)]
    #[case("trainer", "delete_user", false)]
    #[case("student", "enroll_course", true)]
    #[case("student", "view_progress", true)]
    #[case("student", "manage_courses", false)]
    #[case("guest", "view_courses", false)]
    #[case("student", "fly", false)]
    #[case("", "", false)]
    fn permission_table(#[case] role: &str, #[case] action: &str, #[case] expected: bool) {
        assert_eq!(has_permission(role, action), expected);
    }

    #[rstest]
    #[case("admin", "student", "trainer", true)]
    #[case("admin", "trainer", "admin", true)]
    #[case("admin", "admin", "student", false)]
    #[case("trainer", "student", "trainer", false)]
    #[case("admin", "student", "owner", false)]
    fn update_role_table(
        #[case] current: &str,
        #[case] target: &str,
        #[case] new_role: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(can_update_role(current, target, new_role), expected);
    }

    #[rstest]
    #[case("admin", "student", "usr-1", "usr-2", true)]
    #[case("admin", "admin", "usr-1", "usr-2", false)]
    #[case("admin", "student", "usr-1", "usr-1", false)]
    #[case("student", "student", "usr-1", "usr-2", false)]
    fn delete_user_table(
        #[case] current_role: &str,
        #[case] target_role: &str,
        #[case] current_id: &str,
        #[case] target_id: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            can_delete_user(current_role, target_role, current_id, target_id),
            expected
        );
    }

    #[test]
    fn admin_passes_every_gate() {
        for required in Role::ALL {
            assert!(authorize(required, Role::Admin));
        }
        assert!(authorize(Role::Trainer, Role::Trainer));
        assert!(!authorize(Role::Trainer, Role::Student));
        assert!(!authorize(Role::Admin, Role::Trainer));
    }
}
