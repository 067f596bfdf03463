use serde::Serialize;

/// Advisory progress through an ordered list of workflow steps.
///
/// Never blocks an action: steps may be recorded out of order, and tool
/// names that are not steps leave the position untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowTracker {
    steps: Vec<String>,
    current: usize,
    started: bool,
}

impl WorkflowTracker {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            current: 0,
            started: false,
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn current_step_index(&self) -> usize {
        self.current
    }

    /// Move to the position of `tool_name` if it is a step
    pub fn record_step(&mut self, tool_name: &str) {
        if let Some(index) = self.steps.iter().position(|s| s == tool_name) {
            self.current = index;
            self.started = true;
        }
    }

    /// Step after the current one, if any
    pub fn peek_next_step(&self) -> Option<&str> {
        self.steps.get(self.current + 1).map(String::as_str)
    }

    /// Most recently recorded step
    pub fn last_completed(&self) -> Option<&str> {
        if self.started {
            self.steps.get(self.current).map(String::as_str)
        } else {
            None
        }
    }

    /// Step the model should run next: the first step until one is recorded
    pub fn expected_step(&self) -> Option<&str> {
        if self.started {
            self.peek_next_step()
        } else {
            self.steps.first().map(String::as_str)
        }
    }
}
