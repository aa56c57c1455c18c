//! Turning free-form planner output into a [`FixPlan`].

use anyhow::Context;
use medic_core::FixPlan;

/// Parse a planner response.
///
/// Accepts a bare JSON object, a ```` ```json ```` fenced block or any fenced
/// block. Text without a fence becomes a zero-step plan whose root cause and
/// reasoning are the text itself. A fenced block that is not a valid plan is
/// an error.
pub fn parse_plan_response(text: &str) -> anyhow::Result<FixPlan> {
    let trimmed = text.trim();
    if let Ok(plan) = serde_json::from_str::<FixPlan>(trimmed) {
        return Ok(plan);
    }

    if let Some(block) = fenced_block(trimmed) {
        return serde_json::from_str(block.trim()).context("fenced planner response is not a plan");
    }

    tracing::warn!("Planner response contained no JSON; using it as a zero-step plan");
    Ok(FixPlan {
        root_cause: trimmed.to_string(),
        reasoning: trimmed.to_string(),
        steps: Vec::new(),
    })
}

fn fenced_block(text: &str) -> Option<&str> {
    let (open, skip) = match text.find("```json") {
        Some(pos) => (pos, "```json".len()),
        None => (text.find("```")?, "```".len()),
    };
    let body = &text[open + skip..];
    let close = body.find("```").unwrap_or(body.len());
    Some(&body[..close])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_raw_json() {
        let plan = parse_plan_response(
            r#"{"rootCause":"cache full","reasoning":"flush","steps":[{"toolName":"cache_flush"}]}"#,
        )
        .unwrap();
        assert_eq!(plan.root_cause, "cache full");
        assert_eq!(plan.tool_names(), vec!["cache_flush"]);
    }

    #[test]
    fn test_json_fence() {
        let text = "Here is the plan:\n```json\n{\"root_cause\": \"pool exhausted\", \"steps\": [{\"tool_name\": \"restart_container\", \"parameters\": {\"container_name\": \"postgres\"}}]}\n```\nDone.";
        let plan = parse_plan_response(text).unwrap();
        assert_eq!(plan.root_cause, "pool exhausted");
        assert_eq!(plan.steps[0].parameters["container_name"], json!("postgres"));
    }

    #[test]
    fn test_plain_fence() {
        let text = "```\n{\"steps\": []}\n```";
        let plan = parse_plan_response(text).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_prose_becomes_zero_step_plan() {
        let plan = parse_plan_response("  The database is simply overloaded.  ").unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.root_cause, "The database is simply overloaded.");
        assert_eq!(plan.reasoning, plan.root_cause);
    }

    #[test]
    fn test_malformed_fence_is_error() {
        assert!(parse_plan_response("```json\n{not json\n```").is_err());
    }
}
