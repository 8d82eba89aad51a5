//! SM-2 spaced repetition with a minute-scale learning ladder.
//!
//! New cards climb the configured learning steps (short, minute-scale
//! offsets) before graduating into day-scale SM-2 spacing. A failed review
//! at any point drops the card back to the first step.
//!
//! Quality ratings (1-5):
//! - 1: Again, total lapse
//! - 2: Hard, still a lapse
//! - 3: pass boundary (unused by the bundled CLI but valid input)
//! - 4: Good
//! - 5: Easy

use chrono::{DateTime, Duration, Utc};

use super::models::{Flashcard, SchedulerConfig};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f32 = 1.3;

/// Quality at or above this is a pass; below is a lapse.
pub const PASS_QUALITY: i32 = 3;

const MINUTES_PER_DAY: f32 = 1440.0;

/// First-step fallback when a config carries an empty ladder.
const FALLBACK_STEP_MINUTES: i64 = 10;

/// Whether a quality rating counts as a successful recall.
pub fn is_pass(quality: i32) -> bool {
    quality >= PASS_QUALITY
}

/// Compute the card's state after one review.
///
/// Pure function of `(card, quality, config, now)`: no I/O, no clock reads.
/// Only scheduling fields change; confidence and the review counters are
/// the caller's responsibility.
pub fn review(
    card: &Flashcard,
    quality: i32,
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> Flashcard {
    let quality = quality.clamp(1, 5);
    let mut next = card.clone();

    if !is_pass(quality) {
        // Lapse: back to the first learning step, regardless of prior state
        let minutes = first_step_minutes(config);
        next.repetitions = 0;
        next.learning_step_index = 0;
        next.is_new = false;
        next.interval_days = minutes as f32 / MINUTES_PER_DAY;
        next.next_review_at = now + Duration::minutes(minutes);
    } else if card.is_new || card.repetitions == 0 {
        // Still climbing the ladder
        next.is_new = false;
        let index = card.learning_step_index + 1;

        if index < config.learning_steps.len() {
            let minutes = config.learning_steps[index].max(1);
            next.learning_step_index = index;
            next.interval_days = minutes as f32 / MINUTES_PER_DAY;
            next.next_review_at = now + Duration::minutes(minutes);
        } else {
            // Cleared the last step: graduate into day-scale spacing
            next.learning_step_index = index;
            next.repetitions = 1;
            next.interval_days = config
                .graduating_interval_days
                .min(config.max_interval_days);
            next.next_review_at = now + days(next.interval_days);
        }
    } else {
        // Graduated review
        next.repetitions = card.repetitions + 1;

        // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
        let q = quality as f32;
        let ease = card.easiness_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
        next.easiness_factor = ease.max(MIN_EASE_FACTOR);

        let mut multiplier = next.easiness_factor;
        if quality == 5 {
            multiplier *= 1.3;
        } else if quality == PASS_QUALITY {
            // The good-but-not-easy boundary
            multiplier *= 1.2;
        }

        let interval = (card.interval_days * multiplier)
            .round()
            .clamp(0.0, config.max_interval_days);
        next.interval_days = interval;
        next.next_review_at = now + days(interval);
    }

    next
}

/// The would-be intervals (in days) for ratings Again, Hard, Good, Easy.
/// Used to show the user what each rating would give.
pub fn preview_intervals(
    card: &Flashcard,
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> [f32; 4] {
    let again = review(card, 1, config, now).interval_days;
    let hard = review(card, 2, config, now).interval_days;
    let good = review(card, 4, config, now).interval_days;
    let easy = review(card, 5, config, now).interval_days;

    [again, hard, good, easy]
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: f32) -> String {
    if days <= 0.0 {
        return "now".to_string();
    }
    if days < 1.0 {
        let minutes = (days * MINUTES_PER_DAY).round().max(1.0) as i64;
        return format!("{}m", minutes);
    }

    let days = days.round() as i64;
    if days == 1 {
        "1d".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        let weeks = days / 7;
        if weeks == 1 {
            "1w".to_string()
        } else {
            format!("{}w", weeks)
        }
    } else if days < 365 {
        let months = days / 30;
        if months == 1 {
            "1mo".to_string()
        } else {
            format!("{}mo", months)
        }
    } else {
        let years = days / 365;
        if years == 1 {
            "1y".to_string()
        } else {
            format!("{}y", years)
        }
    }
}

fn first_step_minutes(config: &SchedulerConfig) -> i64 {
    config
        .learning_steps
        .first()
        .copied()
        .unwrap_or(FALLBACK_STEP_MINUTES)
        .max(1)
}

fn days(interval: f32) -> Duration {
    Duration::seconds((interval as f64 * 86_400.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_card() -> Flashcard {
        Flashcard::new("Q?".to_string(), "An answer long enough.".to_string())
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    #[test]
    fn test_new_card_pass_enters_second_step() {
        let card = new_card();
        let now = Utc::now();

        let next = review(&card, 4, &config(), now);

        assert!(!next.is_new);
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.learning_step_index, 1);
        // Second step is 1440 minutes
        assert_eq!(next.next_review_at, now + Duration::minutes(1440));
        assert!((next.interval_days - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_second_pass_graduates() {
        let card = new_card();
        let now = Utc::now();

        let step_two = review(&card, 4, &config(), now);
        let graduated = review(&step_two, 4, &config(), now);

        assert_eq!(graduated.repetitions, 1);
        assert_eq!(graduated.interval_days, 6.0);
        assert_eq!(graduated.next_review_at, now + Duration::days(6));
    }

    #[test]
    fn test_single_step_ladder_graduates_on_first_pass() {
        let card = new_card();
        let mut cfg = config();
        cfg.learning_steps = vec![10];

        let next = review(&card, 4, &cfg, Utc::now());

        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 6.0);
    }

    #[test]
    fn test_graduated_review_multiplies_interval() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 3;
        card.interval_days = 10.0;
        card.easiness_factor = 2.5;
        let now = Utc::now();

        let next = review(&card, 4, &config(), now);

        assert_eq!(next.repetitions, 4);
        // 10 * 2.5 = 25
        assert_eq!(next.interval_days, 25.0);
        assert_eq!(next.next_review_at, now + Duration::days(25));
    }

    #[test]
    fn test_easy_boost() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 2;
        card.interval_days = 10.0;
        card.easiness_factor = 2.0;

        let next = review(&card, 5, &config(), Utc::now());

        // EF rises to 2.1, boosted x1.3: round(10 * 2.1 * 1.3) = 27
        assert!((next.easiness_factor - 2.1).abs() < 1e-4);
        assert_eq!(next.interval_days, 27.0);
    }

    #[test]
    fn test_quality_three_is_a_pass_with_smaller_boost() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 2;
        card.interval_days = 10.0;
        card.easiness_factor = 2.5;

        let next = review(&card, 3, &config(), Utc::now());

        assert_eq!(next.repetitions, 3);
        // EF drops to 2.36, boosted x1.2: round(10 * 2.36 * 1.2) = 28
        assert!((next.easiness_factor - 2.36).abs() < 1e-4);
        assert_eq!(next.interval_days, 28.0);
    }

    #[test]
    fn test_lapse_resets_to_first_step() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 7;
        card.learning_step_index = 2;
        card.interval_days = 120.0;
        let now = Utc::now();

        for quality in [1, 2] {
            let next = review(&card, quality, &config(), now);
            assert_eq!(next.repetitions, 0);
            assert_eq!(next.learning_step_index, 0);
            assert!(!next.is_new);
            assert_eq!(next.next_review_at, now + Duration::minutes(10));
        }
    }

    #[test]
    fn test_interval_clamped_to_max() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 20;
        card.interval_days = 300.0;
        card.easiness_factor = 2.5;

        let next = review(&card, 5, &config(), Utc::now());

        assert_eq!(next.interval_days, 365.0);
    }

    #[test]
    fn test_ease_factor_never_below_floor() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 1;
        card.interval_days = 1.0;
        card.easiness_factor = 1.35;
        let cfg = config();

        // Repeated barely-passing reviews keep dragging EF down
        for _ in 0..10 {
            card = review(&card, 3, &cfg, Utc::now());
            assert!(card.easiness_factor >= MIN_EASE_FACTOR);
        }
        assert!((card.easiness_factor - MIN_EASE_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn test_intervals_non_decreasing_under_passes() {
        let mut card = new_card();
        let cfg = config();
        let now = Utc::now();

        // Walk the ladder out
        card = review(&card, 4, &cfg, now);
        card = review(&card, 4, &cfg, now);

        let mut previous = card.interval_days;
        for _ in 0..30 {
            card = review(&card, 4, &cfg, now);
            assert!(card.interval_days >= previous);
            assert!(card.interval_days <= cfg.max_interval_days);
            previous = card.interval_days;
        }
    }

    #[test]
    fn test_empty_ladder_lapse_uses_fallback_step() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 2;
        card.interval_days = 12.0;
        let mut cfg = config();
        cfg.learning_steps.clear();
        let now = Utc::now();

        let next = review(&card, 1, &cfg, now);
        assert_eq!(next.next_review_at, now + Duration::minutes(10));
    }

    #[test]
    fn test_preview_intervals() {
        let mut card = new_card();
        card.is_new = false;
        card.repetitions = 2;
        card.interval_days = 10.0;
        card.easiness_factor = 2.5;

        let [again, hard, good, easy] = preview_intervals(&card, &config(), Utc::now());

        assert!(again < 1.0);
        assert!(hard < 1.0);
        assert_eq!(good, 25.0);
        assert!(easy > good);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0.0), "now");
        assert_eq!(format_interval(10.0 / 1440.0), "10m");
        assert_eq!(format_interval(1.0), "1d");
        assert_eq!(format_interval(5.0), "5d");
        assert_eq!(format_interval(14.0), "2w");
        assert_eq!(format_interval(30.0), "1mo");
        assert_eq!(format_interval(365.0), "1y");
        assert_eq!(format_interval(730.0), "2y");
    }
}
