//! Rule-based topic/task/role classification for chunk text.
//!
//! Classification is an ordered cascade of case-insensitive pattern tests
//! evaluated top to bottom; the first matching rule wins and later rules are
//! skipped. Text that matches nothing falls through to
//! `general`/`reference`/role 1. The cascade is pure and total: every input
//! yields exactly one triple.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Subject area a chunk is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    General,
    Attendance,
    Children,
    Guardians,
    Reports,
    StaffManagement,
    Email,
    Settings,
    Navigation,
    Troubleshooting,
    Overview,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::General => "general",
            Topic::Attendance => "attendance",
            Topic::Children => "children",
            Topic::Guardians => "guardians",
            Topic::Reports => "reports",
            Topic::StaffManagement => "staff_management",
            Topic::Email => "email",
            Topic::Settings => "settings",
            Topic::Navigation => "navigation",
            Topic::Troubleshooting => "troubleshooting",
            Topic::Overview => "overview",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of reader activity the chunk supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Procedure,
    Navigation,
    Reference,
    Troubleshooting,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Procedure => "procedure",
            Task::Navigation => "navigation",
            Task::Reference => "reference",
            Task::Troubleshooting => "troubleshooting",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The topic/task/minimum-role triple attached to every chunk.
///
/// `role_min` is an access-tier floor (1 = lowest-privilege viewer, 10 =
/// administrator) used downstream to filter retrieval results by caller
/// privilege. It is not validated against any external role enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub topic: Topic,
    pub task: Task,
    pub role_min: u8,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            topic: Topic::General,
            task: Task::Reference,
            role_min: 1,
        }
    }
}

/// How a rule resolves its task once its content pattern has matched.
#[derive(Clone, Copy)]
enum TaskRule {
    Fixed(Task),
    /// `procedure` when the text also matches a register/add pattern,
    /// `navigation` otherwise. Used only by the children rule.
    RegisterSplit,
}

struct Rule {
    pattern: Regex,
    topic: Topic,
    task: TaskRule,
    role_min: u8,
}

fn pattern(re: &str) -> Regex {
    Regex::new(&format!("(?i){re}")).expect("classifier pattern must compile")
}

static REGISTER_OR_ADD: LazyLock<Regex> = LazyLock::new(|| pattern("register|add"));

/// Rules in priority order. Order is load-bearing: e.g. text mentioning both
/// check-in and reports classifies as attendance because rule 1 precedes
/// rule 4.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule {
            pattern: pattern("check.?in|attendance|qr.?(code|scan)"),
            topic: Topic::Attendance,
            task: TaskRule::Fixed(Task::Procedure),
            role_min: 1,
        },
        Rule {
            pattern: pattern("register.*child|add.*child|child.*record|formal.?id"),
            topic: Topic::Children,
            task: TaskRule::RegisterSplit,
            role_min: 3,
        },
        Rule {
            pattern: pattern("guardian|parent|emergency"),
            topic: Topic::Guardians,
            task: TaskRule::Fixed(Task::Navigation),
            role_min: 3,
        },
        Rule {
            pattern: pattern("report|analytic|dashboard|statistic"),
            topic: Topic::Reports,
            task: TaskRule::Fixed(Task::Navigation),
            role_min: 5,
        },
        Rule {
            pattern: pattern("staff.*management|volunteer.*assign|access.*level"),
            topic: Topic::StaffManagement,
            task: TaskRule::Fixed(Task::Navigation),
            role_min: 5,
        },
        Rule {
            pattern: pattern("email.*template|send.*email|smtp"),
            topic: Topic::Email,
            task: TaskRule::Fixed(Task::Procedure),
            role_min: 5,
        },
        Rule {
            pattern: pattern("settings|configuration|api.*key|deployment"),
            topic: Topic::Settings,
            task: TaskRule::Fixed(Task::Navigation),
            role_min: 10,
        },
        Rule {
            pattern: pattern("navigation|menu|button|sidebar"),
            topic: Topic::Navigation,
            task: TaskRule::Fixed(Task::Navigation),
            role_min: 1,
        },
        Rule {
            pattern: pattern("error|troubleshoot|fix|debug"),
            topic: Topic::Troubleshooting,
            task: TaskRule::Fixed(Task::Troubleshooting),
            role_min: 1,
        },
        Rule {
            pattern: pattern("introduction|overview|getting.*started"),
            topic: Topic::Overview,
            task: TaskRule::Fixed(Task::Reference),
            role_min: 1,
        },
    ]
});

/// Classifies a chunk's text. Deterministic and side-effect free.
pub fn classify(text: &str) -> Classification {
    for rule in RULES.iter() {
        if rule.pattern.is_match(text) {
            let task = match rule.task {
                TaskRule::Fixed(task) => task,
                TaskRule::RegisterSplit => {
                    if REGISTER_OR_ADD.is_match(text) {
                        Task::Procedure
                    } else {
                        Task::Navigation
                    }
                }
            };
            return Classification {
                topic: rule.topic,
                task,
                role_min: rule.role_min,
            };
        }
    }
    Classification::default()
}
