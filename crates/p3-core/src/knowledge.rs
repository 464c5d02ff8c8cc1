//! Keyword knowledge bases backing the offline assistant.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::role::Role;

/// Reply when no pattern matches the input.
pub const NO_INFORMATION: &str = "I don't have specific information about that topic. Could you ask something else about software development or project management?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub keywords: &'static [&'static str],
    pub responses: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    pub patterns: &'static [Pattern],
}

impl KnowledgeBase {
    pub fn for_role(role: Role) -> &'static KnowledgeBase {
        match role {
            Role::Developer => &DEVELOPER_KNOWLEDGE,
            Role::ProjectManager => &PROJECT_MANAGER_KNOWLEDGE,
            Role::Qa => &QA_KNOWLEDGE,
        }
    }
}

/// Returns every pattern with at least one keyword contained in `input`,
/// ignoring case, in knowledge-base order.
pub fn find_matches<'a>(input: &str, knowledge_base: &'a KnowledgeBase) -> Vec<&'a Pattern> {
    let input = input.to_lowercase();
    knowledge_base
        .patterns
        .iter()
        .filter(|pattern| {
            pattern
                .keywords
                .iter()
                .any(|keyword| input.contains(&keyword.to_lowercase()))
        })
        .collect()
}

/// Picks a random matching pattern, then a random response from it.
pub fn respond<R: Rng + ?Sized>(matches: &[&Pattern], rng: &mut R) -> String {
    matches
        .choose(rng)
        .and_then(|pattern| pattern.responses.choose(rng))
        .map(|response| response.to_string())
        .unwrap_or_else(|| NO_INFORMATION.to_string())
}

pub static DEVELOPER_KNOWLEDGE: KnowledgeBase = KnowledgeBase {
    patterns: &[
        Pattern {
            keywords: &["javascript", "js", "framework", "react"],
            responses: &[
                "React is a JavaScript library for building user interfaces. It's known for its component-based architecture and virtual DOM which optimizes rendering performance.",
                "When working with React, remember to use functional components with hooks for modern development. UseEffect and useState are fundamental hooks to understand.",
            ],
        },
        Pattern {
            keywords: &["node", "backend", "express", "server"],
            responses: &[
                "Node.js allows JavaScript to run on the server-side. Combined with Express, it creates a powerful backend framework for web applications.",
                "For Node.js development, consider using async/await for cleaner asynchronous code instead of callbacks or promise chains.",
            ],
        },
        Pattern {
            keywords: &["database", "sql", "nosql", "mongodb", "postgres"],
            responses: &[
                "MongoDB is a NoSQL database ideal for flexible, document-oriented data structures, while PostgreSQL is a robust relational database with strong ACID compliance.",
                "When designing your database schema, consider the query patterns your application will use to determine the optimal structure.",
            ],
        },
        Pattern {
            keywords: &["api", "rest", "graphql", "endpoint"],
            responses: &[
                "RESTful APIs use standard HTTP methods and stateless communication. GraphQL offers more flexibility with a single endpoint and client-specified queries.",
                "When designing APIs, ensure proper authentication, rate limiting, and clear documentation for developers.",
            ],
        },
        Pattern {
            keywords: &["testing", "jest", "unit test", "integration test"],
            responses: &[
                "Testing is crucial for code quality. Unit tests verify individual components while integration tests check how components work together.",
                "Jest is a popular JavaScript testing framework with built-in mocking capabilities and snapshot testing.",
            ],
        },
        Pattern {
            keywords: &["deployment", "ci/cd", "pipeline", "docker", "kubernetes"],
            responses: &[
                "CI/CD pipelines automate testing and deployment, ensuring code quality and faster releases. Tools like Jenkins, GitHub Actions, and GitLab CI are popular choices.",
                "Docker containers provide environment consistency across development, testing, and production.",
            ],
        },
        Pattern {
            keywords: &["architecture", "structure", "design pattern", "mvc", "mvvm"],
            responses: &[
                "Software architecture defines the structure and relationships between components. Common patterns include MVC, MVVM, and microservices.",
                "Clean architecture emphasizes separation of concerns, with business logic independent of frameworks and UI.",
            ],
        },
        Pattern {
            keywords: &["performance", "optimization", "speed", "load time"],
            responses: &[
                "Web performance optimization involves minimizing file sizes, reducing HTTP requests, and efficient rendering strategies.",
                "Consider code splitting, lazy loading, and memoization to improve React application performance.",
            ],
        },
    ],
};

pub static PROJECT_MANAGER_KNOWLEDGE: KnowledgeBase = KnowledgeBase {
    patterns: &[
        Pattern {
            keywords: &["agile", "scrum", "sprint", "kanban"],
            responses: &[
                "Agile methodologies like Scrum focus on iterative development with regular feedback. Sprints typically last 2-4 weeks with daily standups to track progress.",
                "Kanban is a visual workflow management method that helps teams visualize their work, limit work-in-progress, and maximize efficiency.",
            ],
        },
        Pattern {
            keywords: &["timeline", "deadline", "schedule", "milestone"],
            responses: &[
                "When planning project timelines, always include buffer time for unexpected challenges and technical debt resolution.",
                "Breaking down large projects into smaller milestones makes progress more measurable and provides natural checkpoints for course correction.",
            ],
        },
        Pattern {
            keywords: &["team", "resource", "allocation", "planning"],
            responses: &[
                "Effective resource allocation requires understanding team members' strengths and ensuring they're working on tasks that maximize their contributions.",
                "Consider using a RACI matrix (Responsible, Accountable, Consulted, Informed) to clarify roles and responsibilities in complex projects.",
            ],
        },
        Pattern {
            keywords: &["stakeholder", "communication", "meeting", "report"],
            responses: &[
                "Regular stakeholder communication is essential. Tailor your communication style and level of technical detail to your audience.",
                "Project status reports should be concise, highlight achievements, address challenges transparently, and clearly communicate next steps.",
            ],
        },
        Pattern {
            keywords: &["requirements", "user story", "feature", "scope"],
            responses: &[
                "Well-defined requirements reduce development ambiguity. User stories should follow the format 'As a [role], I want [goal] so that [benefit]'.",
                "Requirements gathering should involve stakeholders early and often, using techniques like interviews, workshops, and prototyping.",
            ],
        },
        Pattern {
            keywords: &["budget", "cost", "estimate", "financial"],
            responses: &[
                "Software project budgeting should account for development hours, infrastructure costs, third-party services, and contingency reserves.",
                "Track actual costs against estimates throughout the project to identify variances early and adjust as needed.",
            ],
        },
        Pattern {
            keywords: &["quality", "qa", "testing", "acceptance criteria"],
            responses: &[
                "Quality assurance strategy should balance automated and manual testing, with clear acceptance criteria for each feature.",
                "Implement quality gates throughout the development process rather than leaving all testing to the end of the project.",
            ],
        },
        Pattern {
            keywords: &["jira", "ticket", "task", "issue tracking"],
            responses: &[
                "JIRA tickets should be specific, measurable, and include clear acceptance criteria. Epics group related stories, while tasks break down implementation steps.",
                "Maintain your JIRA board with regular grooming sessions to ensure tickets are properly prioritized and contain up-to-date information.",
            ],
        },
    ],
};

pub static QA_KNOWLEDGE: KnowledgeBase = KnowledgeBase {
    patterns: &[
        Pattern {
            keywords: &["test plan", "strategy", "scope", "approach"],
            responses: &[
                "A test plan should state scope, approach, environments, entry and exit criteria, and the risks that drive test prioritization.",
                "Start the test strategy from the riskiest user journeys and work outwards; not every feature needs the same depth of coverage.",
            ],
        },
        Pattern {
            keywords: &["test case", "scenario", "edge case", "negative"],
            responses: &[
                "Good test cases have a single purpose, explicit preconditions, precise steps and one observable expected result.",
                "Pair every happy-path scenario with negative and boundary cases: empty input, maximum lengths, invalid formats and permission failures.",
            ],
        },
        Pattern {
            keywords: &["coverage", "traceability", "requirement"],
            responses: &[
                "A traceability matrix maps each requirement to the test cases that verify it, which makes coverage gaps visible immediately.",
                "Measure coverage against requirements and risks, not only lines of code; high code coverage can still miss whole user flows.",
            ],
        },
        Pattern {
            keywords: &["automation", "regression", "selenium", "cypress", "playwright"],
            responses: &[
                "Automate stable, high-value regression paths first and keep exploratory testing for new or volatile features.",
                "Flaky UI tests erode trust in the suite; prefer API-level checks where the behavior does not depend on the UI.",
            ],
        },
        Pattern {
            keywords: &["bug", "defect", "severity", "triage"],
            responses: &[
                "A useful bug report includes environment, exact reproduction steps, expected versus actual behavior and evidence such as logs or screenshots.",
                "Triage defects by severity (impact) and priority (urgency) separately; they often differ.",
            ],
        },
    ],
};
