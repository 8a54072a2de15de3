//! Prompt construction for the three conversation phases.
//!
//! All builders are pure functions of their inputs so the exact text sent to
//! a provider can be asserted in tests.

/// Exact reply a provider gives when it needs no more clarification.
pub const READY_SENTINEL: &str = "READY_TO_GENERATE";

/// Marker recorded in history in place of a blank answer.
pub const SKIPPED_MARKER: &str = "[skipped]";

/// Fixed instruction that opens the question and generation prompts.
pub const SYSTEM_PROMPT: &str = r#"You are an expert author of Claude Code skills.

A skill is a directory containing a SKILL.md file: YAML frontmatter between
`---` lines followed by markdown instructions. Claude reads the frontmatter
`description` to decide when the skill applies, then follows the markdown
body when it does.

Frontmatter fields:
- name (required): lowercase letters, digits and hyphens, at most 64 characters
- description (required): what the skill does and when to use it, 20-1024 characters
- allowed-tools (optional): tools the skill may use without asking, as a list
- context (optional): `fork` to run the skill in a separate context
- user-invocable (optional): true/false, whether users can call it directly
- hooks (optional): automatic actions bound to tool events

Your job is to interview the user briefly, then write a focused, practical
skill with clear step-by-step instructions and concrete examples."#;

const HOOKS_GUIDANCE: &str = "The user wants to include hooks in this skill. Ask about what automatic actions they need (validation, logging, etc.) and which tool events to hook into (PreToolUse, PostToolUse, Stop).";

/// Prompt for the opening round of questions.
pub fn build_open_prompt(intent: &str, wants_hooks: bool, max_questions: u32) -> String {
    let mut prompt = format!(
        "{SYSTEM_PROMPT}\n\n# User's Initial Request\nThe user wants to create a skill for: \"{intent}\""
    );
    if wants_hooks {
        prompt.push_str("\n\n");
        prompt.push_str(HOOKS_GUIDANCE);
    }

    prompt.push_str(&format!(
        "\n\nBased on this request, generate 2-3 intelligent questions (maximum {max_questions} total for the entire conversation) to understand:\n\
         - The specific capabilities needed\n\
         - When the skill should trigger\n\
         - What tools or permissions it might need\n"
    ));
    if wants_hooks {
        prompt.push_str("- What hooks are needed and when they should run\n");
    }
    prompt.push_str(
        "- Any specific requirements or constraints\n\n\
         NOTE: If the user leaves answers blank, apply best practices and reasonable defaults.\n\n\
         Output only the questions as a numbered list, nothing else.",
    );
    prompt
}

/// Instruction appended whenever any answer in the session was skipped.
pub fn skip_instruction(skipped: &[usize]) -> String {
    let ordinals = skipped
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "IMPORTANT: The user skipped some questions (answers {ordinals}). DO NOT ask follow-up questions about those skipped topics - they want best practices applied there. Focus on other aspects if needed."
    )
}

/// Prompt asking whether more clarification is needed.
pub fn build_followup_prompt(
    context: &str,
    questions_remaining: u32,
    max_questions: u32,
    skipped: &[usize],
) -> String {
    let mut prompt = format!(
        "{context}\n\nYou have {questions_remaining} questions remaining (maximum {max_questions} total)."
    );
    if !skipped.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&skip_instruction(skipped));
    }
    prompt.push_str(&format!(
        "\n\nBased on the conversation so far, do you need more information to create an excellent skill?\n\n\
         If YES: Generate 1-2 targeted follow-up questions as a numbered list (but DO NOT repeat topics the user skipped).\n\
         If NO: Respond with exactly: \"{READY_SENTINEL}\"\n\n\
         Output only the questions or \"{READY_SENTINEL}\", nothing else."
    ));
    prompt
}

/// Prompt for the final SKILL.md generation.
pub fn build_generate_prompt(context: &str, wants_hooks: bool) -> String {
    let hooks_rule = if wants_hooks {
        "\n7. Include a `hooks` section in the frontmatter covering the automatic actions discussed"
    } else {
        ""
    };

    format!(
        r#"{SYSTEM_PROMPT}

# Conversation History
{context}

# Your Task
Based on the entire conversation above, generate a complete, production-ready SKILL.md file.

IMPORTANT: If the user left answers blank, apply best practices and make reasonable decisions for those aspects.

CRITICAL YAML REQUIREMENTS - YOU MUST FOLLOW THESE EXACTLY:

1. For descriptions longer than 80 characters, use a folded block scalar:
   description: >
     Your multi-line text here
     will be folded into one line.

2. For lists/arrays, use block list format:
   allowed-tools:
     - Bash
     - Read

3. Example valid frontmatter:
   ---
   name: my-skill
   description: >
     This tool helps with data analysis tasks.
   allowed-tools:
     - Bash
   ---

Requirements:
1. YAML frontmatter must be between --- markers
2. Use folded scalar (>) for descriptions over 80 chars
3. Use block list format for all arrays
4. Write clear markdown instructions with at least one heading
5. Include examples
6. ALL YAML MUST BE PARSEABLE{hooks_rule}

Output ONLY the raw SKILL.md content. No explanations, no code fences."#
    )
}

/// Remove a code fence wrapped around the whole text.
///
/// Both the opening fence (first line) and the closing fence (last line)
/// must be present; otherwise the text is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() >= 2
        && lines[0].trim_start().starts_with("```")
        && lines[lines.len() - 1].trim_start().starts_with("```")
    {
        return lines[1..lines.len() - 1].join("\n");
    }
    trimmed.to_string()
}
