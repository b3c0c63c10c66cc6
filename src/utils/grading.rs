use crate::models::{GameOutcome, PredictionRecord, ResultFlag, ResultFlags, Side};

/// Grade every market of a record against a final result.
/// Grading is a pure function of (picks, outcome), so regrading is idempotent.
pub fn grade(record: &PredictionRecord, outcome: &GameOutcome) -> PredictionRecord {
    let mut graded = record.clone();
    graded.results = result_flags(record, outcome);
    graded
}

/// Result flags a record earns for the given outcome
pub fn result_flags(record: &PredictionRecord, outcome: &GameOutcome) -> ResultFlags {
    ResultFlags {
        moneyline: grade_moneyline(record.moneyline.side, outcome),
        spread: grade_spread(record.spread.pick.side, record.spread.line, outcome),
        total: grade_total(record.total.pick.side, record.total.line, outcome),
    }
}

fn grade_moneyline(side: Side, outcome: &GameOutcome) -> ResultFlag {
    win_or_loss(side == outcome.winner)
}

/// `line` is the home team's spread; the home side covers when margin + line > 0
fn grade_spread(side: Side, line: f64, outcome: &GameOutcome) -> ResultFlag {
    let adjusted = outcome.margin + line;
    if adjusted == 0.0 {
        return ResultFlag::Push;
    }
    let home_covers = adjusted > 0.0;
    match side {
        Side::Home => win_or_loss(home_covers),
        Side::Away => win_or_loss(!home_covers),
        _ => ResultFlag::Pending,
    }
}

fn grade_total(side: Side, line: f64, outcome: &GameOutcome) -> ResultFlag {
    if outcome.total == line {
        return ResultFlag::Push;
    }
    let went_over = outcome.total > line;
    match side {
        Side::Over => win_or_loss(went_over),
        Side::Under => win_or_loss(!went_over),
        _ => ResultFlag::Pending,
    }
}

fn win_or_loss(won: bool) -> ResultFlag {
    if won {
        ResultFlag::Win
    } else {
        ResultFlag::Loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfidencePick, LinePick};
    use chrono::NaiveDate;

    fn pick(side: Side) -> ConfidencePick {
        ConfidencePick {
            side,
            confidence: 60.0,
            probability: 0.6,
        }
    }

    fn record(
        ml: Side,
        spread: Side,
        spread_line: f64,
        total: Side,
        total_line: f64,
    ) -> PredictionRecord {
        PredictionRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            home_team: "Boston Celtics".to_string(),
            away_team: "Miami Heat".to_string(),
            moneyline: pick(ml),
            spread: LinePick {
                pick: pick(spread),
                line: spread_line,
            },
            total: LinePick {
                pick: pick(total),
                line: total_line,
            },
            results: ResultFlags::default(),
        }
    }

    #[test]
    fn test_new_record_is_pending() {
        let r = record(Side::Home, Side::Home, -6.5, Side::Over, 215.5);
        assert!(r.results.is_pending());
    }

    #[test]
    fn test_grade_home_favourite_covers() {
        let r = record(Side::Home, Side::Home, -6.5, Side::Over, 215.5);
        let outcome = GameOutcome::from_scores(118, 104);
        let graded = grade(&r, &outcome);
        assert_eq!(graded.results.moneyline, ResultFlag::Win);
        assert_eq!(graded.results.spread, ResultFlag::Win);
        assert_eq!(graded.results.total, ResultFlag::Win);
        // picks untouched
        assert_eq!(graded.moneyline, r.moneyline);
    }

    #[test]
    fn test_grade_favourite_wins_but_fails_to_cover() {
        let r = record(Side::Home, Side::Home, -6.5, Side::Under, 215.5);
        let outcome = GameOutcome::from_scores(110, 106);
        let flags = result_flags(&r, &outcome);
        assert_eq!(flags.moneyline, ResultFlag::Win);
        assert_eq!(flags.spread, ResultFlag::Loss);
        assert_eq!(flags.total, ResultFlag::Win);
    }

    #[test]
    fn test_grade_away_picks() {
        let r = record(Side::Away, Side::Away, -6.5, Side::Over, 230.0);
        let outcome = GameOutcome::from_scores(100, 104);
        let flags = result_flags(&r, &outcome);
        assert_eq!(flags.moneyline, ResultFlag::Win);
        assert_eq!(flags.spread, ResultFlag::Win);
        assert_eq!(flags.total, ResultFlag::Loss);
    }

    #[test]
    fn test_grade_pushes() {
        let r = record(Side::Home, Side::Home, -4.0, Side::Over, 210.0);
        let outcome = GameOutcome::from_scores(107, 103);
        let flags = result_flags(&r, &outcome);
        assert_eq!(flags.spread, ResultFlag::Push);
        assert_eq!(flags.total, ResultFlag::Push);
    }

    #[test]
    fn test_grading_is_idempotent() {
        let r = record(Side::Home, Side::Away, 3.5, Side::Under, 221.5);
        let outcome = GameOutcome::from_scores(99, 101);
        let once = grade(&r, &outcome);
        let twice = grade(&once, &outcome);
        assert_eq!(once, twice);
    }
}
