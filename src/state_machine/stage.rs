//! The five coaching stages

use serde::Serialize;

pub const FIRST_STAGE: u8 = 1;
pub const LAST_STAGE: u8 = 5;

/// Static description of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
}

pub const STAGES: [StageDefinition; LAST_STAGE as usize] = [
    StageDefinition {
        number: 1,
        name: "Have Clear Goals",
        description: "Define a specific, measurable goal",
    },
    StageDefinition {
        number: 2,
        name: "Identify Problems",
        description: "Identify obstacles preventing goal achievement",
    },
    StageDefinition {
        number: 3,
        name: "Diagnose Root Causes",
        description: "Find the underlying reasons for problems",
    },
    StageDefinition {
        number: 4,
        name: "Design a Plan",
        description: "Create an actionable plan to address root causes",
    },
    StageDefinition {
        number: 5,
        name: "Push Through to Completion",
        description: "Establish execution habits and accountability",
    },
];

pub fn is_valid_stage(number: u8) -> bool {
    (FIRST_STAGE..=LAST_STAGE).contains(&number)
}

pub fn definition(number: u8) -> Option<&'static StageDefinition> {
    STAGES.iter().find(|s| s.number == number)
}

/// Stage description as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageInfo {
    pub number: u8,
    pub name: String,
    pub description: String,
}

impl StageInfo {
    pub fn for_stage(number: u8) -> Self {
        match definition(number) {
            Some(def) => Self::from(def),
            None => Self {
                number,
                name: format!("Step {number}"),
                description: String::new(),
            },
        }
    }
}

impl From<&StageDefinition> for StageInfo {
    fn from(def: &StageDefinition) -> Self {
        Self {
            number: def.number,
            name: def.name.to_string(),
            description: def.description.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_numbered_in_order() {
        for (i, stage) in STAGES.iter().enumerate() {
            assert_eq!(usize::from(stage.number), i + 1);
        }
    }

    #[test]
    fn test_stage_info_fallback() {
        assert_eq!(StageInfo::for_stage(3).name, "Diagnose Root Causes");
        let unknown = StageInfo::for_stage(9);
        assert_eq!(unknown.name, "Step 9");
        assert!(unknown.description.is_empty());
        assert!(!is_valid_stage(0));
        assert!(!is_valid_stage(6));
    }
}
