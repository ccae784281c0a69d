// prompts.rs

pub const SYSTEM_PROMPT: &str =
    "You are an expert Product Manager analyzing App Store reviews. Extract actionable improvements.";

const RESPONSE_FORMAT: &str = r#"### Response Format
Respond with a single JSON object and nothing else:
{"suggestions": [{"area": "...", "description": "...", "priority": "High" | "Medium" | "Low"}]}
* `area`: a short name for the product area (e.g. "Performance", "Login", "Onboarding")
* `description`: one or two sentences describing the concrete improvement
* `priority`: exactly one of High, Medium or Low"#;

/// Builds the user prompt for the improvement suggestion request.
///
/// `reviews_text` is expected to hold one `- review body` line per review.
pub fn improvement_prompt(sample_size: usize, reviews_text: &str) -> String {
    format!(
        "Here are {sample_size} negative reviews for a mobile app. \
Identify the top 3-5 most critical areas for improvement. \
Focus on technical issues, UX problems, or missing features.

{RESPONSE_FORMAT}

Reviews:
{reviews_text}"
    )
}
