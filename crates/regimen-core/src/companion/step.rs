//! Routine step types.

use serde::{Deserialize, Serialize};

/// Upper bound for manual timer adjustment when a step does not declare one.
pub const DEFAULT_MAX_SECONDS: u32 = 600;

/// How a step is presented and whether it can drive a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Read-and-do step with no waiting period.
    Instruction,
    /// Step that requires waiting `wait_seconds` before moving on.
    Timed,
}

impl StepType {
    /// Returns the wire name used in analytics payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Instruction => "instruction",
            StepType::Timed => "timed",
        }
    }
}

/// One instruction unit in a routine.
///
/// `title`, `instruction` and `step_category` are carried for presentation
/// only; the companion engine never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionStep {
    /// Stable step identifier
    pub id: String,
    /// Position in the routine (unique per session)
    pub order: u32,
    pub title: String,
    pub instruction: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    /// Countdown length, required for timed steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_seconds: Option<u32>,
    /// Upper bound for timer adjustment (defaults to 600)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_seconds: Option<u32>,
    /// Product category tag, e.g. "cleanser" or "serum"
    #[serde(default)]
    pub step_category: String,
    /// Whether completing this step triggers a haptic pulse
    #[serde(default)]
    pub haptics: bool,
}

impl CompanionStep {
    /// Creates an untimed instruction step.
    pub fn instruction(
        id: impl Into<String>,
        order: u32,
        title: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            order,
            title: title.into(),
            instruction: instruction.into(),
            step_type: StepType::Instruction,
            wait_seconds: None,
            max_seconds: None,
            step_category: String::new(),
            haptics: false,
        }
    }

    /// Creates a timed step that waits `wait_seconds`.
    pub fn timed(
        id: impl Into<String>,
        order: u32,
        title: impl Into<String>,
        instruction: impl Into<String>,
        wait_seconds: u32,
    ) -> Self {
        Self {
            step_type: StepType::Timed,
            wait_seconds: Some(wait_seconds),
            ..Self::instruction(id, order, title, instruction)
        }
    }

    pub fn with_max_seconds(mut self, max_seconds: u32) -> Self {
        self.max_seconds = Some(max_seconds);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.step_category = category.into();
        self
    }

    pub fn with_haptics(mut self, haptics: bool) -> Self {
        self.haptics = haptics;
        self
    }

    /// Returns true if this step can start a countdown.
    ///
    /// A step typed `timed` without `wait_seconds` is treated as untimed.
    pub fn is_timed(&self) -> bool {
        self.step_type == StepType::Timed && self.wait_seconds.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_requires_wait_seconds() {
        let mut step = CompanionStep::timed("serum", 1, "Serum", "Let it absorb", 30);
        assert!(step.is_timed());

        step.wait_seconds = None;
        assert!(!step.is_timed());

        let plain = CompanionStep::instruction("rinse", 0, "Rinse", "Warm water");
        assert!(!plain.is_timed());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "id": "s1",
            "order": 0,
            "title": "Cleanser",
            "instruction": "Massage for 60 seconds",
            "type": "timed",
            "waitSeconds": 60,
            "stepCategory": "cleanser",
            "haptics": true
        }"#;
        let step: CompanionStep = serde_json::from_str(json).unwrap();
        assert_eq!(step.step_type, StepType::Timed);
        assert_eq!(step.wait_seconds, Some(60));
        assert_eq!(step.max_seconds, None);
        assert!(step.haptics);
    }
}
