//! Prompt text sent to the chat-completion model.

use crate::model::DescriptionRequest;
use crate::repo_ref::RepoReference;

pub const SYSTEM_PROMPT: &str =
    "You are a product analyst. Describe GitHub repositories in clear, simple MVP terms.";

/// Characters of README text included in the prompt.
pub const README_EXCERPT_CHARS: usize = 800;

const UNKNOWN_NAME: &str = "Unknown repository";
const NO_DESCRIPTION: &str = "No description";
const NO_LANGUAGE: &str = "Not specified";
const NO_README: &str = "No README available";

/// Render the user prompt for `request`, substituting defaults for absent fields.
pub fn build_prompt(request: &DescriptionRequest) -> String {
    let data = &request.repo_data;

    let name = non_blank(data.name.as_deref())
        .map(str::to_string)
        .or_else(|| RepoReference::parse(&request.repo_url).map(|r| r.repo))
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let description = non_blank(data.description.as_deref()).unwrap_or(NO_DESCRIPTION);
    let language = non_blank(data.language.as_deref()).unwrap_or(NO_LANGUAGE);
    let stars = data.stargazers_count.unwrap_or(0);
    let readme = match request.readme.as_deref() {
        Some(text) if !text.is_empty() => readme_excerpt(text),
        _ => NO_README,
    };

    format!(
        "Analyze this GitHub repository and describe it in simple MVP (Minimum Viable Product) terms:

Repository: {name}
URL: {url}
Description: {description}
Language: {language}
Stars: {stars}

README excerpt:
{readme}

Provide a clear, concise MVP description covering:
1. What does this project do? (core purpose)
2. Key features (top 3-5)
3. Tech stack used
4. Target users
5. MVP implementation complexity (Easy/Medium/Hard)

Keep it simple and actionable. Maximum 300 words.",
        url = request.repo_url,
    )
}

/// First [`README_EXCERPT_CHARS`] characters of `readme`, cut on a char boundary.
fn readme_excerpt(readme: &str) -> &str {
    match readme.char_indices().nth(README_EXCERPT_CHARS) {
        Some((idx, _)) => &readme[..idx],
        None => readme,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
