//! Portal roles and the post-login redirection policy.
//!
//! `Role` is closed: a role string from the backend either parses into one of
//! the three variants or it is treated as absent. The redirection policy is a
//! total match with a single default arm, so an unknown role always lands on
//! the root route instead of failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub const ROOT_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

/// One entry of a role's navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub path: &'static str,
}

const ADMIN_SECTIONS: &[Section] = &[
    Section { name: "Dashboard", path: "/admin/dashboard" },
    Section { name: "Doctors", path: "/admin/doctors" },
    Section { name: "Patients", path: "/admin/patients" },
    Section { name: "Services", path: "/admin/services" },
    Section { name: "Faqs", path: "/admin/faqs" },
    Section { name: "Analytics", path: "/admin/analytics" },
];

const DOCTOR_SECTIONS: &[Section] = &[
    Section { name: "Dashboard", path: "/doctor/dashboard" },
    Section { name: "Appointments", path: "/doctor/appointments" },
    Section { name: "Patient Info", path: "/doctor/patients" },
];

const PATIENT_SECTIONS: &[Section] = &[
    Section { name: "Dashboard", path: "/patient/dashboard" },
    Section { name: "My Appointments", path: "/patient/appointments" },
    Section { name: "My Health Records", path: "/patient/health-records" },
];

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Patient];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Doctor => "/doctor/dashboard",
            Role::Patient => "/patient/dashboard",
        }
    }

    /// Navigation menu for the role's portal, dashboard first.
    pub fn sections(self) -> &'static [Section] {
        match self {
            Role::Admin => ADMIN_SECTIONS,
            Role::Doctor => DOCTOR_SECTIONS,
            Role::Patient => PATIENT_SECTIONS,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Where to send a user after authentication.
pub fn redirect_path(role: Option<Role>) -> &'static str {
    match role {
        Some(role) => role.dashboard_path(),
        None => ROOT_PATH,
    }
}

/// `redirect_path` for a role string straight off the wire.
pub fn redirect_for(raw: &str) -> &'static str {
    redirect_path(raw.parse().ok())
}

/// Deserialize an optional role, mapping unrecognized or non-string values
/// to `None` instead of failing the whole response.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(|raw| raw.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_redirect_to_distinct_dashboards() {
        assert_eq!(redirect_path(Some(Role::Admin)), "/admin/dashboard");
        assert_eq!(redirect_path(Some(Role::Doctor)), "/doctor/dashboard");
        assert_eq!(redirect_path(Some(Role::Patient)), "/patient/dashboard");
    }

    #[test]
    fn unknown_role_redirects_to_root() {
        assert_eq!(redirect_path(None), "/");
        assert_eq!(redirect_for("nurse"), "/");
        assert_eq!(redirect_for(""), "/");
    }

    #[test]
    fn raw_role_parsing_ignores_case() {
        assert_eq!(redirect_for("Admin"), "/admin/dashboard");
        assert_eq!("PATIENT".parse::<Role>(), Ok(Role::Patient));
        assert_eq!(
            "receptionist".parse::<Role>(),
            Err(UnknownRole("receptionist".to_string()))
        );
    }

    #[test]
    fn role_wire_form_is_lowercase() {
        assert_eq!(serde_json::to_value(Role::Doctor).unwrap(), "doctor");
        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn every_menu_starts_at_its_dashboard() {
        for role in Role::ALL {
            let first = role.sections().first().unwrap();
            assert_eq!(first.path, role.dashboard_path());
            assert!(role.sections().iter().all(|s| s.path.starts_with(&format!("/{role}/"))));
        }
    }

    #[test]
    fn lenient_deserialization_drops_unknown_roles() {
        #[derive(Deserialize)]
        struct User {
            #[serde(default, deserialize_with = "lenient")]
            role: Option<Role>,
        }

        let user: User = serde_json::from_str(r#"{"role":"doctor"}"#).unwrap();
        assert_eq!(user.role, Some(Role::Doctor));
        let user: User = serde_json::from_str(r#"{"role":"superuser"}"#).unwrap();
        assert_eq!(user.role, None);
        let user: User = serde_json::from_str(r#"{"role":7}"#).unwrap();
        assert_eq!(user.role, None);
        let user: User = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(user.role, None);
    }
}
