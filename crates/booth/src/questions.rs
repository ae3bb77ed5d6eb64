//! The fixed interview prompt deck.
//!
//! Navigation is a pure view concern: one continuous recording answers all
//! four questions, so moving between prompts never touches the recorder.

/// A single interview prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub title: &'static str,
    pub prompt: &'static str,
    pub tip: Option<&'static str>,
}

pub const QUESTIONS: [Question; 4] = [
    Question {
        title: "Self-Introduction",
        prompt: "Can you briefly introduce yourself, your background, and what excites you \
                 about joining this program?",
        tip: Some("Be concise and highlight key details about yourself in 1-2 minutes."),
    },
    Question {
        title: "Innovation and Digital Transformation Mindset",
        prompt: "What role do you think digital transformation plays in shaping the future of \
                 banking? Can you share an example of an innovation or technology that could \
                 significantly impact the banking industry?",
        tip: None,
    },
    Question {
        title: "Analytical Thinking and Problem-Solving",
        prompt: "If you were tasked with analyzing why a bank's YoY revenue decreased by 10%, \
                 what steps would you take to identify the root cause?",
        tip: None,
    },
    Question {
        title: "Motivational Fit and Resilience",
        prompt: "Describe a challenging project or task you worked on. How did you approach \
                 it, and what did you learn that could help you in this bootcamp?",
        tip: None,
    },
];

/// Cursor over the prompt list, clamped to its ends.
#[derive(Debug, Default)]
pub struct QuestionDeck {
    index: usize,
}

impl QuestionDeck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &'static Question {
        &QUESTIONS[self.index]
    }

    /// One-based position and total, for display.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, QUESTIONS.len())
    }

    /// Advance to the next prompt. Returns `false` at the end of the deck.
    pub fn next(&mut self) -> bool {
        if self.index + 1 < QUESTIONS.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Step back to the previous prompt. Returns `false` at the start.
    pub fn previous(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }
}
