// "Was this answer helpful?"

pub const FEEDBACK_PROMPT: &str = "Please provide feedback on how we can improve the answer:";
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub helpful: bool,
    /// Trimmed, `None` when blank
    pub comment: Option<String>,
}

impl Feedback {
    pub fn new(helpful: bool, comment: Option<&str>) -> Self {
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Self { helpful, comment }
    }

    /// Only a "No" that says what to improve is kept
    pub fn is_actionable(&self) -> bool {
        !self.helpful && self.comment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comment_is_none() {
        assert_eq!(Feedback::new(false, Some("   ")).comment, None);
        assert_eq!(Feedback::new(false, None).comment, None);
        assert_eq!(
            Feedback::new(false, Some(" too vague ")).comment.as_deref(),
            Some("too vague")
        );
    }

    #[test]
    fn test_actionable() {
        assert!(Feedback::new(false, Some("more detail")).is_actionable());
        assert!(!Feedback::new(false, None).is_actionable());
        assert!(!Feedback::new(true, Some("great")).is_actionable());
    }
}
