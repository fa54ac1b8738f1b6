// @zen-component: COACH-PromptBuilder
//
//! Prompt construction for the coach.
//!
//! Pure and deterministic: the same message and snapshot always render the
//! same two messages.

use crate::models::chat::ChatMessage;
use crate::models::snapshot::Snapshot;

/// Sampling temperature for coaching completions. Kept low so advice stays
/// consistent between calls.
pub const COACH_TEMPERATURE: f32 = 0.4;

/// Persona and output-format instructions; independent of the request.
pub const SYSTEM_PROMPT: &str = "You are AthletIQ Coach, an AI performance assistant.
Be concise, prescriptive, and athlete-friendly.
Use today's metrics and explain \u{201c}why\u{201d} in simple terms.
End with a short \"Today's Plan\" (\u{2264}3 bullets).";

/// Build the system + user message pair for a coaching question.
///
/// The system message always comes first.
pub fn build_coach_messages(message: &str, snapshot: &Snapshot) -> [ChatMessage; 2] {
    let context = render_context(snapshot);
    [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{context}\n\nQuestion: {message}")),
    ]
}

/// Render the metrics block embedded in the user turn.
pub fn render_context(s: &Snapshot) -> String {
    format!(
        "Context
- Readiness: {readiness}
- Recovery: score {score}, HRV {hrv} ms, Resting HR {resting} bpm
- Sleep: {duration} h, Eff {efficiency}%, Consistency {consistency}%
- Workouts: {completed}/{goal} this week",
        readiness = s.readiness,
        score = s.recovery.score,
        hrv = s.recovery.hrv_ms,
        resting = s.recovery.resting_hr,
        duration = one_decimal(s.sleep.duration_hrs),
        efficiency = percent(s.sleep.efficiency),
        consistency = percent(s.sleep.consistency),
        completed = s.workload.completed,
        goal = s.workload.goal,
    )
}

/// Exactly one decimal place.
fn one_decimal(value: f64) -> String {
    to_fixed(value, 1)
}

/// A fraction as a whole-number percentage.
fn percent(fraction: f64) -> String {
    to_fixed(fraction * 100.0, 0)
}

/// Round the exact binary value of `value` once to `digits` decimals.
///
/// Nearest wins; an exact halfway case rounds away from zero. Values such as
/// `1.45` are stored slightly below the tie and round down.
fn to_fixed(value: f64, digits: u32) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    // Exact ties at `digits` places are odd multiples of 2^-(digits + 1).
    let halves = magnitude * 2f64.powi(digits as i32 + 1);
    if halves.fract() == 0.0 && halves % 2.0 == 1.0 {
        let scale = 10u128.pow(digits);
        let units = (5u128.pow(digits) * halves as u128 + 1) / 2;
        return match digits {
            0 => format!("{sign}{units}"),
            _ => format!(
                "{sign}{}.{:0width$}",
                units / scale,
                units % scale,
                width = digits as usize
            ),
        };
    }
    format!("{sign}{:.*}", digits as usize, magnitude)
}
