//! Fixed questionnaires and option lists shown at the gate

/// A yes/no health screening question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthQuestion {
    /// Key used in the stored `health_answers` object
    pub key: &'static str,
    pub label: &'static str,
    pub helper_text: &'static str,
}

/// A site-safety rule the visitor must acknowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteNorm {
    pub id: &'static str,
    pub label: &'static str,
}

pub const HEALTH_QUESTIONS: [HealthQuestion; 6] = [
    HealthQuestion {
        key: "Diarrhea",
        label: "Diarrhea",
        helper_text: "Select yes or no",
    },
    HealthQuestion {
        key: "Vomiting",
        label: "Vomiting",
        helper_text: "Select yes or no",
    },
    HealthQuestion {
        key: "Influenza",
        label: "Influenza",
        helper_text: "Select yes or no",
    },
    HealthQuestion {
        key: "Ear, Nose, Throat infections",
        label: "Ear, Nose, Throat infections",
        helper_text: "Select yes or no",
    },
    HealthQuestion {
        key: "Skin rashes",
        label: "Skin rashes",
        helper_text: "Select yes or no",
    },
    HealthQuestion {
        key: "Recurring boils",
        label: "Recurring boils",
        helper_text: "Select yes or no",
    },
];

pub const SITE_NORMS: [SiteNorm; 6] = [
    SiteNorm {
        id: "hair",
        label: "Wear company hair and beard covers",
    },
    SiteNorm {
        id: "hands",
        label: "Wash and sanitize hands at entrance",
    },
    SiteNorm {
        id: "jewelry",
        label: "Remove all jewelry and watches",
    },
    SiteNorm {
        id: "drink",
        label: "No drinking or eating (including chewing gum)",
    },
    SiteNorm {
        id: "smoking",
        label: "No smoking",
    },
    SiteNorm {
        id: "cuts",
        label: "All cuts must be covered with a suitable plaster",
    },
];

/// Entry lanes (facility gates); the first one is the default
pub const ENTRY_LANES: [&str; 3] = [
    "BAKEMATE FACTORY JEDDAH",
    "AAA HEADOFFICE JEDDAH",
    "AAA HEADOFFICE RIYADH",
];

pub fn health_question(key: &str) -> Option<&'static HealthQuestion> {
    HEALTH_QUESTIONS.iter().find(|q| q.key == key)
}

pub fn site_norm_index(id: &str) -> Option<usize> {
    SITE_NORMS.iter().position(|n| n.id == id)
}

pub fn default_entry_lane() -> &'static str {
    ENTRY_LANES[0]
}
