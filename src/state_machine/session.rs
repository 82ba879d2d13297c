//! Per-session coaching state

use super::stage::{definition, StageInfo, FIRST_STAGE, STAGES};
use crate::history::ConversationTurn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything persisted for one user's run through the stages.
///
/// Loaded at the start of a request, replaced wholesale by the transition
/// function, and saved only after a turn completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_stage: u8,
    /// Completed stage numbers in completion order, no duplicates
    #[serde(default)]
    pub completed_stages: Vec<u8>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub goal: Option<String>,
    /// Latest evaluation per stage, keyed by the stage number as a string
    #[serde(default)]
    pub stage_evaluations: BTreeMap<String, String>,
    #[serde(default)]
    pub sentiment_ema: f64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_stage: FIRST_STAGE,
            completed_stages: Vec::new(),
            history: Vec::new(),
            goal: None,
            stage_evaluations: BTreeMap::new(),
            sentiment_ema: 0.0,
        }
    }
}

impl SessionState {
    pub fn is_completed(&self, stage: u8) -> bool {
        self.completed_stages.contains(&stage)
    }

    /// Record `stage` as complete; returns false if it already was
    pub fn mark_completed(&mut self, stage: u8) -> bool {
        if self.is_completed(stage) {
            return false;
        }
        self.completed_stages.push(stage);
        true
    }

    /// Navigation is allowed to completed stages and the current one
    pub fn can_navigate_to(&self, stage: u8) -> bool {
        stage == self.current_stage || self.is_completed(stage)
    }

    pub fn evaluation(&self, stage: u8) -> Option<&str> {
        self.stage_evaluations
            .get(&stage.to_string())
            .map(String::as_str)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current_stage: self.current_stage,
            completed_stages: self
                .completed_stages
                .iter()
                .map(|&n| CompletedStage::new(n, self.goal.as_deref()))
                .collect(),
            goal: self.goal.clone(),
            stage_info: StageInfo::for_stage(self.current_stage),
            all_stages: STAGES.iter().map(StageInfo::from).collect(),
            sentiment_ema: self.sentiment_ema,
        }
    }
}

/// A completed stage as reported to clients; stage 1 carries the goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedStage {
    pub step: u8,
    pub name: String,
    pub description: String,
    pub goal: Option<String>,
}

impl CompletedStage {
    fn new(step: u8, goal: Option<&str>) -> Self {
        let def = definition(step);
        Self {
            step,
            name: def.map_or_else(|| format!("Step {step}"), |d| d.name.to_string()),
            description: def.map(|d| d.description.to_string()).unwrap_or_default(),
            goal: if step == FIRST_STAGE {
                goal.map(str::to_string)
            } else {
                None
            },
        }
    }
}

/// Read-only snapshot of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub current_stage: u8,
    pub completed_stages: Vec<CompletedStage>,
    pub goal: Option<String>,
    pub stage_info: StageInfo,
    pub all_stages: Vec<StageInfo>,
    pub sentiment_ema: f64,
}
