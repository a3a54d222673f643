//! Prompts for the Markdown refinement pass.
//!
//! Kept in one place so the instructions can be reviewed and tested without
//! a live provider. Callers can override the system prompt via
//! [`crate::config::ConversionConfig::system_prompt`].

/// Default system prompt for tidying a converted blog post.
pub const DEFAULT_REFINE_PROMPT: &str = r#"You are a professional content editor tidying a Markdown blog post that was converted automatically from a word-processor document.

Follow these rules precisely:

1. CONTENT
   - Preserve ALL information in the post
   - Do NOT add any text, headings, summaries or commentary that is not already in the post
   - Keep the original language and wording

2. FORMATTING
   - Fix broken or inconsistent Markdown (headings, lists, emphasis, spacing)
   - Make tables well-formed GFM tables; if a table cannot be shown cleanly,
     present its information as a clear list instead
   - Keep every image and link exactly as written, including its URL

3. OUTPUT FORMAT
   - Output ONLY the revised Markdown
   - Do NOT wrap it in ```markdown fences"#;

/// Build the user message carrying the post to refine.
pub fn refine_request(markdown: &str) -> String {
    format!(
        "Review whether the formatting of this Markdown post is tidy and complete, fix anything that looks wrong, and return only the adjusted result.\n\nOriginal content:\n{markdown}"
    )
}
