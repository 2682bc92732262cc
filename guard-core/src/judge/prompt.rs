//! Policy prompt, history context and response schema sent to the judge.

use serde_json::{json, Value};

use crate::config::Locale;
use crate::history::HistoryEntry;
use crate::verdict::VerdictStatus;

/// Context sent when no prior submissions exist.
pub const EMPTY_HISTORY_CONTEXT: &str = "DATABASE_IS_EMPTY. This is the first video.";

/// User turn accompanying the four frames.
pub fn user_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::Burmese => {
            "YouTube Repetitive Content Policy နဲ့အညီ စစ်ဆေးပေးပါ။ \
             အရင်တင်ထားဖူးတဲ့ ID တွေနဲ့ တူနေရင် ဘယ် ID နဲ့တူလဲဆိုတာ ပြောပါ။ \
             မတူရင်လည်း ဘာလို့ မတူတာလဲ (Safe ဖြစ်တာလဲ) ဆိုတာကို အသေးစိတ် ရှင်းပြပေးပါ။"
        }
        Locale::English => {
            "Check this video against the YouTube Repetitive Content policy. \
             If it matches any previously uploaded ID, say which ID it matches. \
             If it does not match, explain in detail why it is distinct (why it is Safe)."
        }
    }
}

/// Render stored signatures under stable 1-based `[ID_n]` labels.
pub fn history_context(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY_CONTEXT.to_string();
    }

    history
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("[ID_{}] Visual Fingerprint: {}", i + 1, entry.visual_signature))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Answer templates the explanations must follow.
fn explanation_templates(locale: Locale) -> &'static str {
    match locale {
        Locale::Burmese => {
            r#"- If SAFE: "တင်ရန်သင့်တော်ပါသည်။ အကြောင်းရင်းမှာ... [Policy-based reasoning: e.g., Different background, unique subject position, etc.]"
- If REPETITIVE: "မတင်သင့်ပါ။ အကြောင်းရင်းမှာ... [Detailed reason: e.g., Matches ID_X exactly in lighting and subject.]"
- Always explain the logic behind "Repetitive Content Policy" (ထပ်တလဲလဲဖြစ်သော အကြောင်းအရာများ မူဝါဒ)."#
        }
        Locale::English => {
            r#"- If SAFE: "Suitable to upload. The reason is... [Policy-based reasoning: e.g., Different background, unique subject position, etc.]"
- If REPETITIVE: "Do not upload. The reason is... [Detailed reason: e.g., Matches ID_X exactly in lighting and subject.]"
- Always explain the logic behind the "Repetitive Content Policy"."#
        }
    }
}

/// The fixed policy instruction, with the history database appended.
pub fn system_instruction(history: &[HistoryEntry], locale: Locale) -> String {
    format!(
        r#"You are a professional YouTube Content Policy Expert. Your goal is to prevent "Repetitive Content" (ထပ်တလဲလဲဖြစ်သော အကြောင်းအရာများ) violations for a Dharma channel.

POLICY RULES:
1. Repetitive content is content that is visually indistinguishable from other videos on the same channel.
2. Using the same AI-generated video multiple times with only minor audio changes is a violation.
3. You must look for similar backgrounds, monk/statue figures, lighting, and camera movements.

YOUR TASKS:
1. Analyze the 4 provided frames from the NEW video.
2. Generate a detailed "visualSignature": describe the subject, background, color palette, and composition.
3. COMPARE the new signature against the provided history [ID_1, ID_2, ...].
4. Provide a judgment:
   - If it is too similar to any past ID: status = "High Risk", isRepetitive = true, historyCheck.isSimilarToPast = true, historyCheck.matchedVideoIndex = X from [ID_X].
   - If it is distinct: status = "Safe", isRepetitive = false, historyCheck.isSimilarToPast = false.

EXPLANATION REQUIREMENTS (In {language}):
{templates}

HISTORY DATABASE:
{context}"#,
        language = locale.language(),
        templates = explanation_templates(locale),
        context = history_context(history)
    )
}

/// JSON schema the service must follow, in Gemini's OpenAPI subset.
pub fn response_schema(locale: Locale) -> Value {
    let language = locale.language();
    json!({
        "type": "OBJECT",
        "properties": {
            "similarityScore": {
                "type": "NUMBER",
                "description": "Confidence score (0-100) of the most similar match."
            },
            "isRepetitive": { "type": "BOOLEAN" },
            "status": { "type": "STRING", "enum": VerdictStatus::ALL },
            "policyViolations": { "type": "ARRAY", "items": { "type": "STRING" } },
            "recommendations": {
                "type": "STRING",
                "description": format!("Detailed {language} explanation of why it passed or failed policy.")
            },
            "visualSignature": {
                "type": "STRING",
                "description": "A technical description of the visual features."
            },
            "comparisonDetails": {
                "type": "OBJECT",
                "properties": {
                    "composition": { "type": "STRING" },
                    "colors": { "type": "STRING" },
                    "subjectMatter": { "type": "STRING" },
                    "motionAnalysis": { "type": "STRING" }
                },
                "required": ["composition", "colors", "subjectMatter", "motionAnalysis"]
            },
            "historyCheck": {
                "type": "OBJECT",
                "properties": {
                    "isSimilarToPast": { "type": "BOOLEAN" },
                    "matchedVideoIndex": {
                        "type": "NUMBER",
                        "description": "The X index from [ID_X] that matched (1-based)."
                    },
                    "details": {
                        "type": "STRING",
                        "description": format!("Specific {language} comparison against the matched ID.")
                    }
                },
                "required": ["isSimilarToPast", "details"]
            }
        },
        "required": [
            "similarityScore",
            "isRepetitive",
            "status",
            "policyViolations",
            "recommendations",
            "visualSignature",
            "comparisonDetails",
            "historyCheck"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_context() {
        assert_eq!(history_context(&[]), EMPTY_HISTORY_CONTEXT);
        assert!(system_instruction(&[], Locale::Burmese).ends_with(EMPTY_HISTORY_CONTEXT));
    }

    #[test]
    fn test_history_context_labels_are_one_based() {
        let history = vec![
            HistoryEntry::with_timestamp(2, "newest", "t"),
            HistoryEntry::with_timestamp(1, "oldest", "t"),
        ];
        assert_eq!(
            history_context(&history),
            "[ID_1] Visual Fingerprint: newest\n[ID_2] Visual Fingerprint: oldest"
        );
    }

    #[test]
    fn test_schema_matches_verdict_shape() {
        let schema = response_schema(Locale::Burmese);
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 8);
        assert_eq!(
            schema["properties"]["status"]["enum"],
            json!(["Safe", "Warning", "High Risk"])
        );
        let history_required = &schema["properties"]["historyCheck"]["required"];
        assert!(!history_required
            .as_array()
            .unwrap()
            .contains(&json!("matchedVideoIndex")));
    }

    #[test]
    fn test_burmese_is_the_default_explanation_language() {
        let instruction = system_instruction(&[], Locale::default());
        assert!(instruction.contains("EXPLANATION REQUIREMENTS (In Burmese)"));
        assert!(instruction.contains("တင်ရန်သင့်တော်ပါသည်။"));
        assert!(instruction.contains("မတင်သင့်ပါ။"));
        assert!(user_prompt(Locale::default()).starts_with("YouTube Repetitive Content Policy နဲ့အညီ"));
    }

    #[test]
    fn test_english_locale_switches_explanations() {
        let instruction = system_instruction(&[], Locale::English);
        assert!(instruction.contains("EXPLANATION REQUIREMENTS (In English)"));
        assert!(!instruction.contains("မတင်သင့်ပါ။"));
        assert!(user_prompt(Locale::English).starts_with("Check this video"));

        let schema = response_schema(Locale::English);
        assert_eq!(
            schema["properties"]["recommendations"]["description"],
            "Detailed English explanation of why it passed or failed policy."
        );
    }
}
