//! Prompt text for the two LLM sub-calls made while scoring an answer.

use std::fmt::Write as _;

use geovis_core::AliasSet;
use geovis_llm::CompletionRequest;

const PRODUCTS_SYSTEM: &str = "You extract product names from text. \
Reply with a single JSON object and nothing else.";

const COUNTS_SYSTEM: &str = "You count how often companies are mentioned in text. \
Reply with a single JSON object and nothing else.";

/// Ask for the brand's product names mentioned in `answer`.
#[must_use]
pub(crate) fn products_request(brand: &AliasSet, answer: &str, max_tokens: u32) -> CompletionRequest {
    let user = format!(
        "List the names of products or product lines made by {brand} that appear in the answer below. \
Only include names that literally appear in the text. \
Respond as {{\"products\": [\"...\"]}}; use an empty list if there are none.\n\n\
Answer:\n\"\"\"\n{answer}\n\"\"\"",
        brand = brand.name(),
    );
    CompletionRequest::new(PRODUCTS_SYSTEM, &user, max_tokens)
}

/// Ask for per-entity mention counts, listing every alias and product name.
#[must_use]
pub(crate) fn counts_request(
    brand: &AliasSet,
    competitors: &[AliasSet],
    answer: &str,
    max_tokens: u32,
) -> CompletionRequest {
    let mut entities = String::new();
    for set in std::iter::once(brand).chain(competitors) {
        let _ = write!(entities, "- {}", set.name());
        if !set.aliases().is_empty() {
            let _ = write!(entities, " (also: {})", set.aliases().join(", "));
        }
        entities.push('\n');
    }

    let example = std::iter::once(brand)
        .chain(competitors)
        .map(|set| format!("\"{}\": 0", set.name()))
        .collect::<Vec<_>>()
        .join(", ");

    let user = format!(
        "Count how many times each entity below is mentioned in the answer. \
A mention of any listed alternate name counts as a mention of that entity.\n\n\
Entities:\n{entities}\n\
Answer:\n\"\"\"\n{answer}\n\"\"\"\n\n\
Respond with a JSON object mapping each entity name to an integer count, e.g. {{{example}}}."
    );
    CompletionRequest::new(COUNTS_SYSTEM, &user, max_tokens)
}
