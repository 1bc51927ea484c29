//! Prompt builder for the three inference calls.
//!
//! [`PromptBuilder`] holds the instruction text sent alongside each request:
//! * **recognition** — identify the landmark, reply with name + city/country.
//! * **history** — brief tourist-audio-guide history with a word target.
//! * **narration** — tour-guide read-aloud preamble prefixed to the history.
//!
//! The texts are deliberately terse single-purpose instructions; the model
//! output is consumed verbatim by the pipeline, so every prompt ends with a
//! "respond with only …" style constraint.

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Vision call — the reply becomes the landmark name used by later stages.
const RECOGNITION_INSTRUCTION: &str = "\
Identify the primary landmark in this image. Respond with only the name of \
the landmark and its city/country. For example: 'Eiffel Tower, Paris, France'.";

/// Narration preamble — read-aloud tone for the synthesized voice.
const NARRATION_PREAMBLE: &str = "\
Read the following text in a clear, engaging, and slightly enthusiastic \
tone, as if you were a tour guide: ";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the instruction text for each of the three gateway operations.
///
/// # Example
/// ```rust
/// use landmark_guide::gateway::PromptBuilder;
///
/// let prompts = PromptBuilder::new();
/// let history = prompts.history("Eiffel Tower, Paris, France");
/// assert!(history.contains("Eiffel Tower"));
/// assert!(history.contains("150 words"));
/// ```
pub struct PromptBuilder {
    /// Approximate word target for the generated history.
    history_words: usize,
}

impl PromptBuilder {
    /// Create a builder with the default ~150-word history target.
    pub fn new() -> Self {
        Self { history_words: 150 }
    }

    /// Override the history word target (kept short — it is narrated aloud).
    pub fn with_history_words(history_words: usize) -> Self {
        Self { history_words }
    }

    /// Instruction for the landmark-recognition vision call.
    pub fn recognition(&self) -> &'static str {
        RECOGNITION_INSTRUCTION
    }

    /// Instruction for the history-research call about `landmark_name`.
    pub fn history(&self, landmark_name: &str) -> String {
        format!(
            "Tell me a brief, interesting history of {landmark_name}. Focus on \
             key facts and stories suitable for a tourist's audio guide. Keep \
             it concise, around {} words.",
            self.history_words
        )
    }

    /// Full text handed to the speech-synthesis call: preamble + history.
    pub fn narration(&self, history: &str) -> String {
        format!("{NARRATION_PREAMBLE}{history}")
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_asks_for_name_only() {
        let prompts = PromptBuilder::new();
        assert!(prompts.recognition().contains("only the name"));
        assert!(prompts.recognition().contains("city/country"));
    }

    #[test]
    fn history_names_the_landmark_and_word_target() {
        let prompts = PromptBuilder::new();
        let text = prompts.history("Colosseum, Rome, Italy");
        assert!(text.contains("Colosseum, Rome, Italy"));
        assert!(text.contains("around 150 words"));
        assert!(text.contains("audio guide"));
    }

    #[test]
    fn history_word_target_is_configurable() {
        let prompts = PromptBuilder::with_history_words(80);
        assert!(prompts.history("Big Ben").contains("around 80 words"));
    }

    #[test]
    fn narration_prefixes_the_tour_guide_preamble() {
        let prompts = PromptBuilder::new();
        let text = prompts.narration("It was built in 1889.");
        assert!(text.starts_with("Read the following text"));
        assert!(text.ends_with("It was built in 1889."));
        assert!(text.contains("tour guide"));
    }
}
