use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use super::dto::{AdviceResult, MealAnalysis};
use crate::error::{DiaryError, DiaryResult};
use crate::meals::dto::MealPhotoAnalysis;

lazy_static! {
    static ref CODE_FENCE_RE: Regex = Regex::new(r"```(?:json|JSON)?[ \t]*\r?\n?").unwrap();
}

/// Byte range of the first balanced `{ ... }` in `text`, skipping braces inside strings.
fn first_json_object(text: &str) -> Option<(usize, usize)> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + i + ch.len_utf8()));
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisPayload {
    Wrapped {
        #[serde(rename = "mealAnalysis")]
        meal_analysis: MealAnalysis,
        #[serde(default)]
        advice: Option<String>,
    },
    Flat(MealAnalysis),
}

/// Splits a model reply into structured meal analysis and free-text advice.
///
/// The first JSON object found is removed from the text when it parses as a
/// meal analysis. Otherwise the whole reply is returned untouched as advice.
pub fn parse_reply(content: &str) -> AdviceResult {
    let Some((start, end)) = first_json_object(content) else {
        return AdviceResult {
            advice: content.to_string(),
            meal_analysis: None,
        };
    };

    match serde_json::from_str::<AnalysisPayload>(&content[start..end]) {
        Ok(payload) => {
            let rest = format!("{}{}", &content[..start], &content[end..]);
            let rest = CODE_FENCE_RE.replace_all(&rest, "").trim().to_string();
            let (meal_analysis, inline_advice) = match payload {
                AnalysisPayload::Wrapped {
                    meal_analysis,
                    advice,
                } => (meal_analysis, advice),
                AnalysisPayload::Flat(a) => (a, None),
            };
            let advice = match inline_advice {
                Some(a) if rest.is_empty() => a.trim().to_string(),
                _ => rest,
            };
            AdviceResult {
                advice,
                meal_analysis: Some(meal_analysis),
            }
        }
        Err(e) => {
            warn!(error = %e, "meal analysis JSON did not parse; using raw reply as advice");
            AdviceResult {
                advice: content.to_string(),
                meal_analysis: None,
            }
        }
    }
}

/// Strict parse of the `{description, calories}` reply used to prefill a meal.
pub fn parse_meal_photo(content: &str) -> DiaryResult<MealPhotoAnalysis> {
    let (start, end) = first_json_object(content)
        .ok_or_else(|| DiaryError::Upstream("photo analysis reply had no JSON".into()))?;
    let analysis: MealPhotoAnalysis = serde_json::from_str(&content[start..end])
        .map_err(|e| DiaryError::Upstream(format!("photo analysis reply did not parse: {e}")))?;
    if analysis.description.trim().is_empty()
        || !analysis.calories.is_finite()
        || analysis.calories < 0.0
    {
        return Err(DiaryError::Upstream(
            "photo analysis reply had an invalid description or calories".into(),
        ));
    }
    Ok(analysis)
}
