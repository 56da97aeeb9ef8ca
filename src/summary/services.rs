use std::collections::HashSet;

use time::{Date, Month};
use tracing::{debug, instrument, warn};

use super::model::{DailyBalance, DailySummary, MonthlyProgress};
use crate::body::repo_types::BodyRecord;
use crate::dates::{day_range, is_recent, month_days};
use crate::error::DiaryResult;
use crate::health::provider::{fetch_snapshot, HealthSnapshot};
use crate::meals::repo_types::MealRecord;
use crate::settings::services::current_settings;
use crate::state::AppState;
use crate::workouts::repo_types::{WorkoutRecord, WorkoutSource};

/// Sum starting from `+0.0`. `Iterator::sum` on floats yields `-0.0` when empty.
fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, v| acc + v)
}

/// Pure daily aggregation.
///
/// Only records dated `date` are counted. When a health snapshot is present its
/// active and basal energy are added to the burn, and synced workouts are left
/// out of the sum because the provider's active energy already contains them.
pub fn aggregate(
    date: Date,
    meals: &[MealRecord],
    workouts: &[WorkoutRecord],
    body: Option<&BodyRecord>,
    health: Option<&HealthSnapshot>,
) -> DailySummary {
    let meals: Vec<MealRecord> = meals.iter().filter(|m| m.date == date).cloned().collect();
    let workouts: Vec<WorkoutRecord> = workouts
        .iter()
        .filter(|w| w.date == date)
        .cloned()
        .collect();

    let total_intake_calories = total(meals.iter().map(|m| m.calories));
    let total_protein_g = total(meals.iter().filter_map(|m| m.protein_g));
    let total_fat_g = total(meals.iter().filter_map(|m| m.fat_g));
    let total_carb_g = total(meals.iter().filter_map(|m| m.carb_g));

    let counted = |w: &&WorkoutRecord| health.is_none() || w.source == WorkoutSource::Manual;
    let logged_workout_calories = total(workouts.iter().filter(counted).map(|w| w.calories));
    let mut exercise_minutes = total(workouts.iter().map(|w| w.duration_minutes));

    let (active, basal, steps) = match health {
        Some(h) => {
            let synced: HashSet<&str> = workouts
                .iter()
                .filter_map(|w| w.external_id.as_deref())
                .collect();
            exercise_minutes += total(
                h.workouts
                    .iter()
                    .filter(|s| !synced.contains(s.external_id.as_str()))
                    .map(|s| s.duration_minutes()),
            );
            (
                Some(h.active_energy_kcal),
                Some(h.basal_energy_kcal),
                Some(h.steps),
            )
        }
        None => (None, None, None),
    };

    let total_energy_burned =
        logged_workout_calories + active.unwrap_or(0.0) + basal.unwrap_or(0.0);
    let body = body.filter(|b| b.date == date);

    DailySummary {
        date,
        total_intake_calories,
        total_energy_burned,
        net_calories: total_energy_burned - total_intake_calories,
        logged_workout_calories,
        active_energy_burned: active,
        basal_energy_burned: basal,
        steps,
        exercise_minutes,
        total_protein_g,
        total_fat_g,
        total_carb_g,
        body_weight_kg: body.map(|b| b.weight_kg),
        body_fat_percentage: body.and_then(|b| b.body_fat_percentage),
        calorie_goal: None,
        remaining_calories: None,
        health_included: health.is_some(),
        meals,
        workouts,
    }
}

/// Provider data for `date`, or `None` when the date is stale or the provider fails.
async fn recent_health(st: &AppState, date: Date, today: Date) -> Option<HealthSnapshot> {
    if !is_recent(date, today) {
        return None;
    }
    let range = day_range(date).ok()?;
    match fetch_snapshot(st.health.as_ref(), range).await {
        Ok(snap) => Some(snap),
        Err(e) => {
            warn!(error = %e, %date, "health provider fetch failed; summarising local records only");
            None
        }
    }
}

#[instrument(skip(st))]
pub async fn build_daily_summary(st: &AppState, date: Date, today: Date) -> DiaryResult<DailySummary> {
    let records = async {
        tokio::try_join!(
            st.meals.list_by_date(date),
            st.workouts.list_by_date(date),
            st.body.latest_for_date(date),
            current_settings(st),
        )
    };
    let (records, health) = tokio::join!(records, recent_health(st, date, today));
    let (meals, workouts, body, settings) = records?;

    let summary = aggregate(date, &meals, &workouts, body.as_ref(), health.as_ref())
        .with_goal(settings.daily_calorie_goal);
    debug!(
        intake = summary.total_intake_calories,
        burned = summary.total_energy_burned,
        net = summary.net_calories,
        health = summary.health_included,
        "daily summary built"
    );
    Ok(summary)
}

#[instrument(skip(st))]
pub async fn monthly_progress(
    st: &AppState,
    year: i32,
    month: Month,
    today: Date,
) -> DiaryResult<MonthlyProgress> {
    let label = format!("{year:04}-{:02}", month as u8);
    let days = month_days(year, month, today)?;
    let settings = current_settings(st).await?;
    let goal = settings.monthly_saving_goal;

    let (Some(&first), Some(&last)) = (days.first(), days.last()) else {
        return Ok(MonthlyProgress {
            month: label,
            current: 0.0,
            goal,
            remaining: goal.max(0.0),
            percent: 0.0,
            days: Vec::new(),
        });
    };

    let (meals, workouts) = tokio::try_join!(
        st.meals.list_between(first, last),
        st.workouts.list_between(first, last),
    )?;

    let mut balances = Vec::with_capacity(days.len());
    for day in days {
        let health = recent_health(st, day, today).await;
        let s = aggregate(day, &meals, &workouts, None, health.as_ref());
        balances.push(DailyBalance {
            date: day,
            intake: s.total_intake_calories,
            burned: s.total_energy_burned,
            net: s.net_calories,
        });
    }

    let current = total(balances.iter().map(|b| b.net));
    let percent = if goal > 0.0 {
        (current / goal).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Ok(MonthlyProgress {
        month: label,
        current,
        goal,
        remaining: (goal - current).max(0.0),
        percent,
        days: balances,
    })
}
