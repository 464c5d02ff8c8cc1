//! Offline analyst that answers from canned analyses and the role knowledge
//! bases instead of calling the remote service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{AnalysisBackend, AnalysisResponse, AnalysisResult};
use crate::config::{Config, DEFAULT_MOCK_LATENCY_MS};
use crate::knowledge::{find_matches, respond, KnowledgeBase};
use crate::request::{AnalyzeRequest, DocumentRequest, ImproveRequest};
use crate::role::AnalysisType;

pub const INVALID_URL: &str = "Please provide a valid Confluence or Atlassian URL.";
pub const UNREADABLE_DOCUMENT: &str = "The uploaded document could not be decoded.";

#[derive(Clone)]
pub struct MockAnalyst {
    rng: Arc<Mutex<StdRng>>,
    latency: Duration,
}

impl MockAnalyst {
    pub fn new() -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            latency: Duration::from_millis(DEFAULT_MOCK_LATENCY_MS),
        }
    }

    /// Deterministic analyst for tests and `--seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            latency: Duration::from_millis(DEFAULT_MOCK_LATENCY_MS),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new().with_latency(Duration::from_millis(config.mock_latency_ms()))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockAnalyst {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisBackend for MockAnalyst {
    async fn analyze(&self, request: &AnalyzeRequest) -> AnalysisResult {
        let url = request.url.to_lowercase();
        if !url.contains("confluence") && !url.contains("atlassian") {
            tracing::debug!(url = %request.url, "offline analyst rejected url");
            return Ok(Some(AnalysisResponse {
                error: Some(INVALID_URL.to_string()),
                ..AnalysisResponse::default()
            }));
        }

        self.simulate_latency().await;

        Ok(Some(AnalysisResponse {
            status: Some("success".to_string()),
            generated_content: Some(canned_analysis(&request.action).to_string()),
            error: None,
            extracted_content: Some(page_extract(&request.url)),
        }))
    }

    async fn improve(&self, request: &ImproveRequest) -> AnalysisResult {
        self.simulate_latency().await;

        let knowledge_base = KnowledgeBase::for_role(request.role.role());
        let matches = find_matches(&request.user_feedback, knowledge_base);
        let reply = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            respond(&matches, &mut *rng)
        };
        tracing::debug!(role = request.role.as_str(), matches = matches.len(), "offline reply");

        Ok(Some(AnalysisResponse {
            generated_content: Some(reply),
            ..AnalysisResponse::default()
        }))
    }

    async fn analyze_document(&self, request: &DocumentRequest) -> AnalysisResult {
        let bytes = match STANDARD.decode(&request.content) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(file = %request.file_name, "undecodable document: {}", err);
                return Ok(Some(AnalysisResponse {
                    error: Some(UNREADABLE_DOCUMENT.to_string()),
                    ..AnalysisResponse::default()
                }));
            }
        };

        self.simulate_latency().await;

        Ok(Some(AnalysisResponse {
            status: Some("success".to_string()),
            generated_content: Some(canned_analysis(&request.action).to_string()),
            error: None,
            extracted_content: Some(document_extract(&request.file_name, bytes.len())),
        }))
    }
}

fn page_extract(url: &str) -> String {
    format!(
        "CONFLUENCE PAGE: Project Requirements and Technical Specifications\n\
         URL: {url}\n\
         Space: PROJ\n\
         Page ID: 12345678\n\
         \n\
         {EXTRACT_BODY}"
    )
}

fn document_extract(file_name: &str, size: usize) -> String {
    format!(
        "CONFLUENCE DOCUMENT: {file_name}\n\
         Size: {size} bytes\n\
         \n\
         {EXTRACT_BODY}"
    )
}

const EXTRACT_BODY: &str = "\
CONTENT SECTION 1: Introduction
This document outlines the requirements and specifications for the new system.
The project aims to improve user experience and performance.

CONTENT SECTION 2: Requirements
- User authentication and authorization
- Document management
- Reporting and analytics
- Notifications and alerts

CONTENT SECTION 3: Technical Specifications
- Frontend: React with TypeScript
- Backend: Node.js with Express
- Database: PostgreSQL
- Hosting: AWS";

/// Canned analysis for an action label; unknown labels get a general review.
pub fn canned_analysis(action: &str) -> &'static str {
    match AnalysisType::from_action_label(action) {
        Some(AnalysisType::Lld) => LLD,
        Some(AnalysisType::CodeGen) => CODE_STRUCTURE,
        Some(AnalysisType::Gaps) => GAPS,
        Some(AnalysisType::TechnicalDetails) => TECHNICAL_DETAILS,
        Some(AnalysisType::Summary) => SUMMARY,
        Some(AnalysisType::Requirements) => REQUIREMENTS,
        Some(AnalysisType::Planning) => PLANNING,
        Some(AnalysisType::Subtasks) => SUBTASKS,
        Some(AnalysisType::Timeline) => TIMELINE,
        Some(AnalysisType::TestPlan) => TEST_PLAN,
        Some(AnalysisType::TestCases) => TEST_CASES,
        Some(AnalysisType::TestCoverage) => TEST_COVERAGE,
        None => GENERAL,
    }
}

const LLD: &str = "## Low-Level Design
### Authentication Module
- **AuthService** issues, validates and refreshes JWT tokens
- **UserRepository** is the data access layer for users
- **AuthController** exposes login, logout and registration endpoints
### Document Management
- **DocumentService** owns document business logic
- **StorageProvider** abstracts file storage, with an S3 implementation
- **PermissionValidator** checks per-document access
### Data Model
```typescript
interface Document {
  id: string;
  title: string;
  ownerId: string;
  updatedAt: Date;
}
```";

const CODE_STRUCTURE: &str = "## Code Structure
### Layout
- `src/api/` request handlers grouped by resource
- `src/services/` business logic, one service per aggregate
- `src/db/` repositories and migrations
### Conventions
- Services receive repositories through their constructor
- Handlers never touch the database directly
### Skeleton
```typescript
export class DocumentService {
  constructor(private readonly documents: DocumentRepository) {}

  async get(id: string): Promise<Document> {
    return this.documents.findById(id);
  }
}
```";

const GAPS: &str = "## Requirement Gaps
### Missing Acceptance Criteria
- Document upload has no limit on file size or accepted formats
- Notification delivery does not define retry behaviour
### Ambiguities
- *Real-time* notifications are not quantified; state a latency target
- Admin permission management does not say who can create admins
### Non-functional Requirements
1. No availability target is given
2. Data retention for deleted documents is unspecified";

const TECHNICAL_DETAILS: &str = "## Technical Architecture
### Frontend
- React 18 with TypeScript
- Redux for state management
### Backend
- Node.js with Express
- PostgreSQL database
- REST API with JWT authentication
### Infrastructure
- AWS hosting (EC2, S3, RDS)
- CI/CD with GitHub Actions
- Docker containerization";

const SUMMARY: &str = "## Summary of Confluence Document
### Overview
The document covers requirements and technical specifications for a new web application with mobile support.
### Key Points
- Target completion is Q3
- Stakeholders are the Product, Engineering and QA teams
- The stack is React, Node.js and PostgreSQL";

const REQUIREMENTS: &str = "## Requirements and User Stories
### Functional Requirements
1. Users must be able to register and log in securely
2. Users must be able to upload and manage documents
3. The system must support real-time notifications
### User Stories
- As a user, I want to search documents by keyword
- As an admin, I want to manage user permissions
- As a user, I want to be notified when a document I follow changes";

const PLANNING: &str = "## Project Plan
### Phase 1: Foundation
- Environment setup and CI pipeline
- Authentication and user management
### Phase 2: Core Features
- Document upload, storage and search
- Permission model
### Phase 3: Hardening
- Notifications
- Performance testing and launch readiness
### Risks
- Search relevance may need an external engine
- Notification volume is not yet estimated";

const SUBTASKS: &str = "## JIRA Tickets
### Epic: Authentication
- PROJ-101 Implement registration endpoint
- PROJ-102 Implement login with JWT issuance
- PROJ-103 Add token refresh flow
### Epic: Documents
- PROJ-201 Upload API with S3 storage
- PROJ-202 Keyword search over document titles and bodies
- PROJ-203 Per-document permission checks
### Epic: Notifications
- PROJ-301 Notification preferences model
- PROJ-302 Email delivery provider";

const TIMELINE: &str = "## Timeline Estimation
### Estimates
| Workstream | Estimate |
|---|---|
| Authentication | 2 weeks |
| Documents | 4 weeks |
| Notifications | 2 weeks |
| Testing and launch | 2 weeks |
### Milestones
1. Week 2: authentication complete
2. Week 6: document management in beta
3. Week 10: production launch";

const TEST_PLAN: &str = "## Test Plan
### Scope
Authentication, document management and notifications for web and mobile clients.
### Approach
- Unit tests for every service
- API contract tests for each endpoint
- End-to-end tests for the main user journeys
### Environments
- Staging mirrors production data volumes
### Exit Criteria
- No open critical defects
- All high-priority test cases pass";

const TEST_CASES: &str = "## Test Cases
### TC-01 Successful Login
1. Open the login page
2. Enter valid credentials
3. Submit the form
- **Expected:** the dashboard is shown and a session token is stored
### TC-02 Upload Oversized Document
1. Select a file larger than the allowed limit
2. Start the upload
- **Expected:** the upload is rejected with a size error
### TC-03 Permission Denied
1. Log in as a user without access to a document
2. Open the document URL
- **Expected:** an access denied page is shown";

const TEST_COVERAGE: &str = "## Test Coverage Analysis
### Covered
- Login and registration flows
- Document upload happy path
### Not Covered
- Token refresh and expiry
- Concurrent edits of the same document
- Notification delivery failures
### Recommendations
1. Add integration tests for token expiry
2. Add load tests for search";

const GENERAL: &str = "## General Analysis
The document mixes business requirements, technical specifications and timeline information for a new web application.

Key sections include the project overview, goals, architecture, team structure and implementation timeline. It is well structured but would benefit from detailed acceptance criteria for each requirement.";
