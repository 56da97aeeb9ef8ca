use std::fmt::Write as _;

use crate::dates::format_date;
use crate::meals::repo_types::MealType;
use crate::summary::model::DailySummary;

pub const ADVICE_SYSTEM_PROMPT: &str = "You are a friendly nutrition and fitness coach. \
Give practical, specific suggestions in plain prose. Do not use markdown headings.";

pub const PHOTO_ADVICE_SYSTEM_PROMPT: &str = "You are a dietitian's assistant. \
Analyse the meal photo and estimate its calories, protein, fat and carbohydrates. \
Start your reply with one JSON object of the form \
{\"estimatedCalories\": number, \"proteinGrams\": number, \"fatGrams\": number, \"carbGrams\": number} \
and follow it with short advice that takes the rest of the day into account.";

pub const MEAL_PHOTO_SYSTEM_PROMPT: &str = "You analyse meal photos. \
Briefly describe the food in the photo and estimate its calories. \
Reply only with JSON of the form {\"description\": \"meal description\", \"calories\": number}. \
Calories must be a number. No extra explanation.";

pub const MEAL_PHOTO_USER_PROMPT: &str =
    "Analyse the meal in this photo and return its description and calories as JSON.";

fn or_not_recorded(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "not recorded".to_string(),
    }
}

/// Text-mode prompt embedding the day's totals.
pub fn daily_advice_prompt(s: &DailySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analyse the health data for {} and give concrete advice.",
        format_date(s.date)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "[Body]");
    let _ = writeln!(out, "- Weight: {}", or_not_recorded(s.body_weight_kg, " kg"));
    let _ = writeln!(out, "- Body fat: {}", or_not_recorded(s.body_fat_percentage, "%"));
    let _ = writeln!(out);
    let _ = writeln!(out, "[Activity]");
    let _ = writeln!(out, "- Exercise time: {:.0} min", s.exercise_minutes);
    let _ = writeln!(
        out,
        "- Energy burned: {:.0} kcal (active {:.0} kcal + basal {:.0} kcal + logged workouts {:.0} kcal)",
        s.total_energy_burned,
        s.active_energy_burned.unwrap_or(0.0),
        s.basal_energy_burned.unwrap_or(0.0),
        s.logged_workout_calories
    );
    if let Some(steps) = s.steps {
        let _ = writeln!(out, "- Steps: {steps:.0}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[Intake]");
    match s.calorie_goal {
        Some(goal) => {
            let _ = writeln!(
                out,
                "- Calories eaten: {:.0} kcal (daily goal {goal:.0} kcal)",
                s.total_intake_calories
            );
        }
        None => {
            let _ = writeln!(out, "- Calories eaten: {:.0} kcal", s.total_intake_calories);
        }
    }
    let _ = writeln!(
        out,
        "- Protein {:.0} g, fat {:.0} g, carbs {:.0} g",
        s.total_protein_g, s.total_fat_g, s.total_carb_g
    );
    let _ = writeln!(
        out,
        "- Net balance: {:+.0} kcal (positive means a deficit)",
        s.net_calories
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Consider:");
    let _ = writeln!(out, "1. Is the amount of activity adequate?");
    let _ = writeln!(out, "2. Is the calorie balance reasonable?");
    let _ = writeln!(out, "3. Is the change in body composition healthy?");
    let _ = writeln!(out, "4. Which habits could be improved?");
    let _ = writeln!(out);
    out.push_str("Reply with actionable suggestions in about 300 characters.");
    out
}

/// Photo-mode prompt: the image travels separately as a data URL.
pub fn photo_advice_prompt(s: &DailySummary, meal_type: MealType) -> String {
    format!(
        "Analyse this {} photo.\n\nThe day so far:\n\
         - Calories eaten: {:.0} kcal\n\
         - Calories burned: {:.0} kcal\n\
         - Protein: {:.0} g\n\
         - Fat: {:.0} g\n\
         - Carbs: {:.0} g",
        meal_type.as_str(),
        s.total_intake_calories,
        s.total_energy_burned,
        s.total_protein_g,
        s.total_fat_g,
        s.total_carb_g
    )
}

#[cfg(test)]
mod prompt_tests {
    use super::*;
    use crate::summary::services::aggregate;
    use time::macros::date;

    #[test]
    fn daily_prompt_embeds_totals() {
        let mut s = aggregate(date!(2024 - 04 - 26), &[], &[], None, None);
        s.total_intake_calories = 1450.0;
        s.total_energy_burned = 1900.0;
        s.net_calories = 450.0;
        s.calorie_goal = Some(2000.0);

        let p = daily_advice_prompt(&s);
        assert!(p.contains("2024-04-26"));
        assert!(p.contains("Calories eaten: 1450 kcal (daily goal 2000 kcal)"));
        assert!(p.contains("Net balance: +450 kcal"));
        assert!(p.contains("Weight: not recorded"));
        assert!(p.contains("about 300 characters"));
    }

    #[test]
    fn photo_prompt_names_meal_type() {
        let s = aggregate(date!(2024 - 04 - 26), &[], &[], None, None);
        let p = photo_advice_prompt(&s, MealType::Dinner);
        assert!(p.starts_with("Analyse this dinner photo."));
        assert!(p.contains("Calories eaten: 0 kcal"));
    }
}
