// Shared prompt constants used across assistant tasks.
// Task-specific wording lives in assistant/prompts.rs.

/// Enforces that every answer is grounded in the supplied profile data.
pub const GROUNDING_INSTRUCTION: &str = "Use ONLY the information provided below. \
    Do not invent or assume facts that are not present. \
    If the information is not available, say so instead of guessing.";

/// Appended after an output schema whenever the reply must be machine-parseable.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond ONLY with valid JSON that matches the schema. \
    No prose before or after it, no markdown, no code fences.";

/// Section heading that introduces an output schema.
pub const SCHEMA_HEADING: &str = "OUTPUT SCHEMA";

/// Section heading that introduces the flat list of task directives.
pub const RULES_HEADING: &str = "RULES";
