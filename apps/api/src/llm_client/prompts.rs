// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Output contract appended to every long-form generation prompt.
pub const MARKDOWN_OUTPUT_INSTRUCTION: &str = "\
**Output Format:** Markdown with clear headings, bullet points, and emphasis on ACTION ITEMS.
**Tone:** Professional but accessible. Avoid jargon where possible.
**Length:** Comprehensive (2000-2500 words).
Do NOT wrap the whole answer in a code fence.";

/// Keeps the model from presenting itself as a substitute for professional advice.
pub const ADVISORY_INSTRUCTION: &str = "\
Where a rule depends on facts the profile does not state, say so and name the \
assumption instead of guessing. Recommend consulting a Chartered Accountant for \
filings with penalties attached.";
