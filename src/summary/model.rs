use serde::Serialize;
use time::Date;

use crate::meals::repo_types::MealRecord;
use crate::workouts::repo_types::WorkoutRecord;

/// Derived on demand from one day's records plus the health snapshot. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub total_intake_calories: f64,
    pub total_energy_burned: f64,
    /// Burned minus intake. Positive is a deficit.
    pub net_calories: f64,
    pub logged_workout_calories: f64,
    pub active_energy_burned: Option<f64>,
    pub basal_energy_burned: Option<f64>,
    pub steps: Option<f64>,
    pub exercise_minutes: f64,
    pub total_protein_g: f64,
    pub total_fat_g: f64,
    pub total_carb_g: f64,
    pub body_weight_kg: Option<f64>,
    pub body_fat_percentage: Option<f64>,
    pub calorie_goal: Option<f64>,
    pub remaining_calories: Option<f64>,
    pub health_included: bool,
    pub meals: Vec<MealRecord>,
    pub workouts: Vec<WorkoutRecord>,
}

impl DailySummary {
    pub fn with_goal(mut self, goal: f64) -> Self {
        self.calorie_goal = Some(goal);
        self.remaining_calories = Some(goal - self.total_intake_calories);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBalance {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub intake: f64,
    pub burned: f64,
    pub net: f64,
}

/// Calorie "savings" accumulated over a month against the monthly goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProgress {
    pub month: String,
    pub current: f64,
    pub goal: f64,
    pub remaining: f64,
    /// `current / goal` clamped to `[0, 1]`.
    pub percent: f64,
    pub days: Vec<DailyBalance>,
}
