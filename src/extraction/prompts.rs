// ABOUTME: Instruction prompts for the workout plan extraction call
// ABOUTME: Fixed system prompt plus per-request user prompt carrying the catalog summary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Repforge Labs

use crate::catalog::CatalogExercise;

/// Fixed system instruction for the extraction call.
///
/// The service is asked to return bare JSON matching the draft shape and to
/// resolve exercises against the supplied catalog, reporting a confidence
/// per match and leaving `exercise_id` null below 0.70.
pub const SYSTEM_PROMPT: &str = r#"You are a workout plan parser that extracts structured information from text and matches exercises to a reference catalog.

Your task:
1. Identify the plan name and description.
2. Group exercises into workouts (days/sessions) based on day labels, headers, or logical groupings. If no grouping is clear, create a single workout named "Workout 1".
3. Extract every exercise with its parameters and preserve the exact source wording in original_text.
4. Match each exercise to the closest catalog entry and report its id and your confidence.
5. Parse sets, reps (as a min/max range), rest times, and any notes (tempo, RPE, special instructions).

Return ONLY valid JSON with this exact structure:
{
  "name": "Plan name (or 'Workout Plan' if not specified)",
  "description": "Plan description (or null)",
  "workouts": [
    {
      "name": "Day 1",
      "day_number": 1,
      "order_index": 0,
      "exercises": [
        {
          "exercise_id": "uuid-from-catalog",
          "original_text": "Exact exercise name from text",
          "confidence": 0.95,
          "sets": [
            {"reps_min": 10, "reps_max": 15},
            {"reps_min": 8, "reps_max": 12}
          ],
          "rest_seconds": 90,
          "notes": "Any special instructions",
          "sequence": 0
        }
      ]
    }
  ]
}

Rules:
- day_number starts at 1, order_index starts at 0 and must be unique across workouts.
- Exercise sequence starts at 0 and increments within each workout.
- For sets, return one object per set. If the text shows the same reps for every set (e.g. "3x8-12"), repeat the object. If set data is uniform you may instead return "sets" as a number together with exercise-level "reps_min"/"reps_max" (or a single "reps" value when reps is one number).
- If reps is a single number (e.g. "5"), use it for both min and max.
- If rest time is not specified, use null.
- Confidence bands: 0.90-1.0 exact or very close match; 0.80-0.89 minor variation; 0.70-0.79 notable differences; below 0.70 set exercise_id to null and confidence to 0.0.
- If no plan name is found, use "Workout Plan".

Return ONLY the JSON object, no explanations."#;

/// Serialize the catalog for the prompt: id, name, primary muscle groups
fn build_catalog_summary(catalog: &[CatalogExercise]) -> String {
    catalog
        .iter()
        .map(|ex| {
            let groups = ex
                .primary_muscle_groups
                .iter()
                .map(|g| format!("{g:?}").to_lowercase())
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {} (ID: {}) - Primary: {}", ex.name, ex.id, groups)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt carrying the catalog summary and the raw text
pub fn build_user_prompt(raw_text: &str, catalog: &[CatalogExercise]) -> String {
    format!(
        "Available exercises in the catalog:\n{}\n\n\
         Parse this workout plan and match exercises to the catalog:\n\n{}\n\n\
         Return the structured JSON data with exercise_id for each matched exercise.",
        build_catalog_summary(catalog),
        raw_text
    )
}
