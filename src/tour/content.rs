//! Tour content — the per-role step lists and overview narration.
//!
//! Pure static data. Every role starts with the shared dashboard step.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One stop in the walkthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TourStep {
    /// Unique within its config.
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Selector of the on-screen element to highlight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_selector: Option<&'static str>,
    pub narration_text: &'static str,
}

/// The tour for one role.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct RoleTourConfig {
    pub overview_narration: &'static str,
    pub steps: &'static [TourStep],
}

impl RoleTourConfig {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&'static TourStep> {
        self.steps.get(index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }
}

/// Viewer roles that have a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Nurse,
    Doctor,
    LabTechnician,
    Pharmacist,
    Researcher,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Nurse,
        Role::Doctor,
        Role::LabTechnician,
        Role::Pharmacist,
        Role::Researcher,
    ];

    /// Role used when the viewer's role has no tour of its own.
    pub const DEFAULT: Role = Role::Admin;

    /// Parse a role name, ignoring case and surrounding whitespace.
    ///
    /// Looser than the web client's lookup, which matches the exact key, so
    /// `"NURSE"` gets the nurse tour here but the admin tour there.
    pub fn parse(name: &str) -> Option<Role> {
        let name = name.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Nurse => "nurse",
            Self::Doctor => "doctor",
            Self::LabTechnician => "lab_technician",
            Self::Pharmacist => "pharmacist",
            Self::Researcher => "researcher",
        }
    }

    pub fn config(&self) -> &'static RoleTourConfig {
        match self {
            Self::Admin => &ADMIN_TOUR,
            Self::Nurse => &NURSE_TOUR,
            Self::Doctor => &DOCTOR_TOUR,
            Self::LabTechnician => &LAB_TECHNICIAN_TOUR,
            Self::Pharmacist => &PHARMACIST_TOUR,
            Self::Researcher => &RESEARCHER_TOUR,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a role name to its tour. Unknown roles get the admin tour.
pub fn get_config(role: &str) -> &'static RoleTourConfig {
    resolve_role(role).config()
}

/// Resolve a role name, falling back to [`Role::DEFAULT`].
pub fn resolve_role(role: &str) -> Role {
    Role::parse(role).unwrap_or(Role::DEFAULT)
}

static DATA_TOUR_SELECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[data-tour="([^"]+)"\]$"#).unwrap());

/// Extract `key` from a `[data-tour="key"]` selector.
pub fn data_tour_key(selector: &str) -> Option<&str> {
    DATA_TOUR_SELECTOR
        .captures(selector.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

const DASHBOARD: TourStep = TourStep {
    id: "dashboard",
    title: "Dashboard",
    description: "Your central hub showing key statistics, today's appointments, and pending tasks at a glance.",
    target_selector: Some(r#"[data-tour="dashboard"]"#),
    narration_text: "This is your dashboard, showing key statistics and today's activities.",
};

static ADMIN_TOUR: RoleTourConfig = RoleTourConfig {
    overview_narration: "Welcome to CardioRegistry, your comprehensive cardiovascular patient management system. \
        As an administrator, you have full access to all modules including patient management, appointments, \
        laboratory services, pharmacy, surgical operations, ICU care, reports, user management, and system settings. \
        Let me walk you through each section.",
    steps: &[
        DASHBOARD,
        TourStep {
            id: "patients",
            title: "Patient Management",
            description: "Register new patients, view medical histories, and manage patient records.",
            target_selector: Some(r#"[data-tour="patients"]"#),
            narration_text: "Patient Management allows you to register and manage all patient records.",
        },
        TourStep {
            id: "appointments",
            title: "Appointments",
            description: "Schedule, track, and manage patient appointments with doctors.",
            target_selector: Some(r#"[data-tour="appointments"]"#),
            narration_text: "The Appointments module handles scheduling and appointment tracking.",
        },
        TourStep {
            id: "lab",
            title: "Laboratory",
            description: "Order lab tests, enter results, and track test status.",
            target_selector: Some(r#"[data-tour="lab"]"#),
            narration_text: "Laboratory services for ordering and managing lab tests.",
        },
        TourStep {
            id: "pharmacy",
            title: "Pharmacy",
            description: "Manage prescriptions and medication dispensing.",
            target_selector: Some(r#"[data-tour="pharmacy"]"#),
            narration_text: "Pharmacy module for prescriptions and medication management.",
        },
        TourStep {
            id: "surgery",
            title: "Surgery Suite",
            description: "Coordinate pre-operative, intra-operative, and post-operative care.",
            target_selector: Some(r#"[data-tour="surgery"]"#),
            narration_text: "Surgery Suite manages the complete surgical workflow.",
        },
        TourStep {
            id: "users",
            title: "User Management",
            description: "Manage staff accounts, roles, and permissions.",
            target_selector: Some(r#"[data-tour="users"]"#),
            narration_text: "User Management for staff accounts and access control.",
        },
        TourStep {
            id: "settings",
            title: "Settings",
            description: "Configure system preferences and customize the application.",
            target_selector: Some(r#"[data-tour="settings"]"#),
            narration_text: "Settings to customize your system preferences.",
        },
    ],
};

static NURSE_TOUR: RoleTourConfig = RoleTourConfig {
    overview_narration: "Welcome to CardioRegistry. As a nurse, you can manage patient vitals, \
        assist with appointments, and support pre and post-operative care. \
        Let me show you the key features available to you.",
    steps: &[
        DASHBOARD,
        TourStep {
            id: "patients",
            title: "Patients",
            description: "View patient records and medical histories.",
            target_selector: Some(r#"[data-tour="patients"]"#),
            narration_text: "Access patient records and medical information.",
        },
        TourStep {
            id: "vitals",
            title: "Vitals",
            description: "Record and monitor patient vital signs.",
            target_selector: Some(r#"[data-tour="vitals"]"#),
            narration_text: "Record vital signs including blood pressure, heart rate, and temperature.",
        },
        TourStep {
            id: "appointments",
            title: "Appointments",
            description: "View and manage patient appointments.",
            target_selector: Some(r#"[data-tour="appointments"]"#),
            narration_text: "Track and manage patient appointments.",
        },
        TourStep {
            id: "icu",
            title: "ICU",
            description: "Monitor and care for ICU patients.",
            target_selector: Some(r#"[data-tour="icu"]"#),
            narration_text: "ICU module for intensive care patient monitoring.",
        },
    ],
};

static DOCTOR_TOUR: RoleTourConfig = RoleTourConfig {
    overview_narration: "Welcome to CardioRegistry. As a doctor, you can manage your patients, \
        conduct consultations, review lab results, and write prescriptions. \
        Here's an overview of your available tools.",
    steps: &[
        DASHBOARD,
        TourStep {
            id: "my-patients",
            title: "My Patients",
            description: "View and manage your assigned patients.",
            target_selector: Some(r#"[data-tour="my-patients"]"#),
            narration_text: "Access your assigned patients and their records.",
        },
        TourStep {
            id: "consultations",
            title: "Consultations",
            description: "Conduct and document patient consultations.",
            target_selector: Some(r#"[data-tour="consultations"]"#),
            narration_text: "Document patient consultations and diagnoses.",
        },
        TourStep {
            id: "schedule",
            title: "My Schedule",
            description: "View and manage your appointment schedule.",
            target_selector: Some(r#"[data-tour="schedule"]"#),
            narration_text: "Manage your daily and weekly schedule.",
        },
        TourStep {
            id: "lab-results",
            title: "Lab Results",
            description: "Review patient laboratory results.",
            target_selector: Some(r#"[data-tour="lab-results"]"#),
            narration_text: "Review laboratory test results for your patients.",
        },
        TourStep {
            id: "prescriptions",
            title: "Prescriptions",
            description: "Write and manage patient prescriptions.",
            target_selector: Some(r#"[data-tour="prescriptions"]"#),
            narration_text: "Create and manage patient prescriptions.",
        },
    ],
};

static LAB_TECHNICIAN_TOUR: RoleTourConfig = RoleTourConfig {
    overview_narration: "Welcome to CardioRegistry. As a lab technician, you can view pending lab orders, \
        enter test results, and manage laboratory workflow. Let me show you around.",
    steps: &[
        DASHBOARD,
        TourStep {
            id: "lab-orders",
            title: "Lab Orders",
            description: "View and process pending laboratory test orders.",
            target_selector: Some(r#"[data-tour="lab-orders"]"#),
            narration_text: "View and process pending lab test orders.",
        },
        TourStep {
            id: "lab-results",
            title: "Lab Results",
            description: "Enter and verify laboratory test results.",
            target_selector: Some(r#"[data-tour="lab-results"]"#),
            narration_text: "Enter and manage laboratory test results.",
        },
    ],
};

static PHARMACIST_TOUR: RoleTourConfig = RoleTourConfig {
    overview_narration: "Welcome to CardioRegistry. As a pharmacist, you can view prescriptions, \
        dispense medications, and track dispensing history. Here's your workflow overview.",
    steps: &[
        DASHBOARD,
        TourStep {
            id: "prescriptions",
            title: "Prescriptions",
            description: "View pending prescriptions ready for dispensing.",
            target_selector: Some(r#"[data-tour="prescriptions"]"#),
            narration_text: "View prescriptions awaiting dispensing.",
        },
        TourStep {
            id: "pharmacy",
            title: "Pharmacy",
            description: "Dispense medications and manage inventory.",
            target_selector: Some(r#"[data-tour="pharmacy"]"#),
            narration_text: "Dispense medications to patients.",
        },
        TourStep {
            id: "history",
            title: "Dispensing History",
            description: "View past medication dispensing records.",
            target_selector: Some(r#"[data-tour="history"]"#),
            narration_text: "Review medication dispensing history.",
        },
    ],
};

static RESEARCHER_TOUR: RoleTourConfig = RoleTourConfig {
    overview_narration: "Welcome to CardioRegistry. As a researcher, you can access anonymized data \
        and research dashboards. Here's an overview of your available tools.",
    steps: &[
        DASHBOARD,
        TourStep {
            id: "research",
            title: "Research Dashboard",
            description: "Access research data and analytics.",
            target_selector: Some(r#"[data-tour="research"]"#),
            narration_text: "Access research analytics and anonymized data.",
        },
    ],
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_role_has_steps_with_unique_ids() {
        for role in Role::ALL {
            let config = role.config();
            assert!(!config.is_empty(), "{role} has no steps");
            assert!(!config.overview_narration.is_empty());

            let mut seen = HashSet::new();
            for step in config.steps {
                assert!(!step.id.is_empty(), "{role} has a step with empty id");
                assert!(seen.insert(step.id), "{role} repeats step id {}", step.id);
                assert!(!step.narration_text.is_empty());
            }
        }
    }

    #[test]
    fn every_selector_is_a_data_tour_attribute() {
        for role in Role::ALL {
            for step in role.config().steps {
                let selector = step.target_selector.expect("all built-in steps target an element");
                assert_eq!(data_tour_key(selector), Some(step.id));
            }
        }
    }

    #[test]
    fn tours_open_on_the_dashboard() {
        for role in Role::ALL {
            assert_eq!(role.config().steps[0].id, "dashboard");
        }
    }

    #[test]
    fn unknown_roles_fall_back_to_admin() {
        for name in ["", "janitor", "ADMINISTRATOR", "lab technician", "🙂"] {
            assert_eq!(get_config(name), &ADMIN_TOUR, "role {name:?}");
        }
    }

    #[test]
    fn known_roles_resolve_to_their_own_tour() {
        assert_eq!(get_config("nurse").len(), 5);
        assert_eq!(get_config("doctor").len(), 6);
        assert_eq!(get_config("lab_technician").len(), 3);
        assert_eq!(get_config("pharmacist").len(), 4);
        assert_eq!(get_config("researcher").len(), 2);
        assert_eq!(get_config("admin").len(), 8);
    }

    #[test]
    fn role_parse_ignores_case_and_whitespace() {
        assert_eq!(Role::parse("  Nurse "), Some(Role::Nurse));
        assert_eq!(Role::parse("LAB_TECHNICIAN"), Some(Role::LabTechnician));
        assert_eq!(Role::parse("surgeon"), None);
    }

    #[test]
    fn role_display_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
            let parsed: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn data_tour_key_rejects_other_selectors() {
        assert_eq!(data_tour_key(r#"[data-tour="vitals"]"#), Some("vitals"));
        assert_eq!(data_tour_key("#vitals"), None);
        assert_eq!(data_tour_key(r#"[data-tour=""]"#), None);
    }

    #[test]
    fn last_index_bounds() {
        let config = Role::Researcher.config();
        assert_eq!(config.last_index(), Some(1));
        assert!(config.step(2).is_none());
    }
}
