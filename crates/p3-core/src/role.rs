//! Professional roles, the analysis types each role may request, and the
//! codes the analysis service expects on the wire.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    ProjectManager,
    Qa,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::ProjectManager => "pm",
            Role::Qa => "qa",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "developer" | "dev" => Some(Role::Developer),
            "pm" | "project_manager" | "project manager" => Some(Role::ProjectManager),
            "qa" => Some(Role::Qa),
            _ => None,
        }
    }

    pub fn all() -> Vec<Role> {
        vec![Role::Developer, Role::ProjectManager, Role::Qa]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Developer => "Developer",
            Role::ProjectManager => "Project Manager",
            Role::Qa => "QA",
        }
    }

    /// Analysis types offered to this role, in menu order.
    pub fn analysis_types(&self) -> &'static [AnalysisType] {
        match self {
            Role::Developer => &[
                AnalysisType::Lld,
                AnalysisType::CodeGen,
                AnalysisType::Gaps,
                AnalysisType::TechnicalDetails,
            ],
            Role::ProjectManager => &[
                AnalysisType::Summary,
                AnalysisType::Requirements,
                AnalysisType::Planning,
                AnalysisType::Subtasks,
                AnalysisType::Timeline,
            ],
            Role::Qa => &[
                AnalysisType::TestPlan,
                AnalysisType::TestCases,
                AnalysisType::TestCoverage,
            ],
        }
    }

    pub fn allows(&self, analysis_type: AnalysisType) -> bool {
        self.analysis_types().contains(&analysis_type)
    }

    /// Assistant message appended when the user switches into this role.
    pub fn mode_switch_message(&self) -> &'static str {
        match self {
            Role::Developer => "Switched to Developer mode. How can I assist you? Please select an analysis type and provide either a Confluence URL or upload a PDF.",
            Role::ProjectManager => "Switched to Project Manager mode. How can I assist you? Please select an analysis type and provide either a Confluence URL or upload a PDF.",
            Role::Qa => "Switched to QA mode. How can I assist you? Please select an analysis type and provide either a Confluence URL or upload a PDF.",
        }
    }

    pub fn code(&self) -> RoleCode {
        match self {
            Role::Developer => RoleCode::Dev,
            Role::ProjectManager => RoleCode::Pm,
            Role::Qa => RoleCode::Qa,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Developer
    }
}

/// Role identifier as sent to the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleCode {
    Dev,
    Pm,
    Qa,
}

impl RoleCode {
    /// Code used when a role name cannot be resolved. Both endpoints share it.
    pub const FALLBACK: RoleCode = RoleCode::Dev;

    /// Resolves a role name to its wire code, falling back to [`RoleCode::FALLBACK`].
    pub fn resolve(role: &str) -> RoleCode {
        Role::from_str(role)
            .map(|r| r.code())
            .unwrap_or(Self::FALLBACK)
    }

    pub fn role(&self) -> Role {
        match self {
            RoleCode::Dev => Role::Developer,
            RoleCode::Pm => Role::ProjectManager,
            RoleCode::Qa => Role::Qa,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::Dev => "dev",
            RoleCode::Pm => "pm",
            RoleCode::Qa => "qa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    // Developer
    Lld,
    CodeGen,
    Gaps,
    TechnicalDetails,
    // Project manager
    Summary,
    Requirements,
    Planning,
    Subtasks,
    Timeline,
    // QA
    TestPlan,
    TestCases,
    TestCoverage,
}

impl AnalysisType {
    pub fn all() -> Vec<AnalysisType> {
        Role::all()
            .iter()
            .flat_map(|r| r.analysis_types().iter().copied())
            .collect()
    }

    /// Key used in selections and requests, e.g. `"lld"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Lld => "lld",
            AnalysisType::CodeGen => "code_gen",
            AnalysisType::Gaps => "gaps",
            AnalysisType::TechnicalDetails => "technical_details",
            AnalysisType::Summary => "summary",
            AnalysisType::Requirements => "requirements",
            AnalysisType::Planning => "planning",
            AnalysisType::Subtasks => "subtasks",
            AnalysisType::Timeline => "timeline",
            AnalysisType::TestPlan => "test_plan",
            AnalysisType::TestCases => "test_cases",
            AnalysisType::TestCoverage => "test_coverage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let key = s.trim();
        Self::all().into_iter().find(|t| t.as_str() == key)
    }

    /// Human-readable action label understood by the analysis service.
    pub fn action_label(&self) -> &'static str {
        match self {
            AnalysisType::Lld => "Low Level Design",
            AnalysisType::CodeGen => "Code Structure",
            AnalysisType::Gaps => "Requirement gaps",
            AnalysisType::TechnicalDetails => "Technical Details",
            AnalysisType::Summary => "Summary",
            AnalysisType::Requirements => "Requirements",
            AnalysisType::Planning => "Project Planning",
            AnalysisType::Subtasks => "JIRA Tickets",
            AnalysisType::Timeline => "Timeline Estimation",
            AnalysisType::TestPlan => "Test Plan",
            AnalysisType::TestCases => "Test Cases",
            AnalysisType::TestCoverage => "Test Coverage",
        }
    }

    /// Reverse lookup of [`AnalysisType::action_label`].
    pub fn from_action_label(label: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.action_label() == label)
    }

    /// Label shown in the analysis type menu.
    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisType::Gaps => "Requirement Gaps",
            other => other.action_label(),
        }
    }

    /// Role whose menu offers this analysis type.
    pub fn role(&self) -> Role {
        Role::all()
            .into_iter()
            .find(|r| r.allows(*self))
            .unwrap_or_default()
    }
}

/// Looks up the action label for an analysis type key.
pub fn action_label(analysis_type: &str) -> Option<&'static str> {
    AnalysisType::from_str(analysis_type).map(|t| t.action_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_name() {
        for role in Role::all() {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("Project_Manager"), Some(Role::ProjectManager));
        assert_eq!(Role::from_str("designer"), None);
    }

    #[test]
    fn test_role_codes() {
        assert_eq!(RoleCode::resolve("developer").as_str(), "dev");
        assert_eq!(RoleCode::resolve("pm").as_str(), "pm");
        assert_eq!(RoleCode::resolve("qa").as_str(), "qa");
        assert_eq!(RoleCode::resolve("architect"), RoleCode::FALLBACK);
        assert_eq!(serde_json::to_string(&RoleCode::Pm).unwrap(), "\"pm\"");
    }

    #[test]
    fn test_analysis_types_partition_roles() {
        let all = AnalysisType::all();
        assert_eq!(all.len(), 12);
        for t in all {
            let owners: Vec<Role> = Role::all().into_iter().filter(|r| r.allows(t)).collect();
            assert_eq!(owners, vec![t.role()]);
        }
    }

    #[test]
    fn test_action_table() {
        assert_eq!(action_label("lld"), Some("Low Level Design"));
        assert_eq!(action_label("subtasks"), Some("JIRA Tickets"));
        assert_eq!(action_label("test_coverage"), Some("Test Coverage"));
        assert_eq!(action_label(""), None);
        assert_eq!(action_label("haiku"), None);
        assert_eq!(
            AnalysisType::from_action_label("Timeline Estimation"),
            Some(AnalysisType::Timeline)
        );
    }
}
