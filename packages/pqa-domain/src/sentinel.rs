/// True when the question, trimmed and lowercased, is one of `tokens`.
///
/// `tokens` are expected to be normalized already (see `pqa_config::load`).
pub fn is_termination(question: &str, tokens: &[String]) -> bool {
	let normalized = question.trim().to_lowercase();

	tokens.iter().any(|token| *token == normalized)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens() -> Vec<String> {
		vec!["exit".to_string(), "quit".to_string(), "退出".to_string()]
	}

	#[test]
	fn matches_case_insensitively() {
		assert!(is_termination("EXIT", &tokens()));
		assert!(is_termination("  Quit \n", &tokens()));
		assert!(is_termination("退出", &tokens()));
	}

	#[test]
	fn ignores_questions_containing_a_token() {
		assert!(!is_termination("how do I exit", &tokens()));
		assert!(!is_termination("退出了吗", &tokens()));
		assert!(!is_termination("", &tokens()));
	}
}
