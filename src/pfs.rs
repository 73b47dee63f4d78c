use crate::models::{OutcomeKind, OutcomeMeasure};

/// Observed progression-free survival in days, and whether it ended in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PfsOutcome {
    pub days: Option<i32>,
    pub had_event: Option<bool>,
}

impl PfsOutcome {
    fn unknown() -> Self {
        PfsOutcome::default()
    }

    fn measured(day: i32, plan_start: i32, had_event: bool) -> Self {
        PfsOutcome {
            days: Some(day - plan_start),
            had_event: Some(had_event),
        }
    }
}

pub struct OutcomeInterpreter;

impl OutcomeInterpreter {
    /// Reduce a tumor's outcome measures to a single PFS observation relative to the plan window.
    ///
    /// Measures must be in the order they were recorded. Any measure without a day, a censor mixed
    /// with other measures, or a death before the last measure makes the series uninterpretable.
    pub fn determine(
        plan_start: Option<i32>,
        plan_stop: Option<i32>,
        measures: &[OutcomeMeasure],
    ) -> PfsOutcome {
        let Some(plan_start) = plan_start else {
            return PfsOutcome::unknown();
        };

        let Some(days) = measures
            .iter()
            .map(|m| m.day.map(|day| (m.kind, day)))
            .collect::<Option<Vec<_>>>()
        else {
            return PfsOutcome::unknown();
        };

        if !Self::is_consistent(measures) {
            return PfsOutcome::unknown();
        }

        let mut after_start: Vec<(OutcomeKind, i32)> =
            days.into_iter().filter(|(_, day)| *day >= plan_start).collect();
        after_start.sort_by_key(|(_, day)| *day);

        match after_start.as_slice() {
            [] => PfsOutcome::unknown(),
            [(kind, day)] => PfsOutcome::measured(*day, plan_start, *kind != OutcomeKind::Censor),
            [.., (_, latest)] => {
                let Some(plan_stop) = plan_stop else {
                    return PfsOutcome::unknown();
                };
                let day = after_start
                    .iter()
                    .map(|(_, day)| *day)
                    .find(|day| *day >= plan_stop)
                    .unwrap_or(*latest);
                PfsOutcome::measured(day, plan_start, true)
            }
        }
    }

    fn is_consistent(measures: &[OutcomeMeasure]) -> bool {
        let censor_among_several =
            measures.len() > 1 && measures.iter().any(|m| m.kind == OutcomeKind::Censor);
        let early_death = measures
            .split_last()
            .map(|(_, earlier)| earlier.iter().any(|m| m.kind == OutcomeKind::Death))
            .unwrap_or(false);
        !censor_among_several && !early_death
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progression(day: Option<i32>) -> OutcomeMeasure {
        OutcomeMeasure {
            kind: OutcomeKind::Progression,
            day,
            follow_up_event: None,
        }
    }

    fn censor(day: i32) -> OutcomeMeasure {
        OutcomeMeasure {
            kind: OutcomeKind::Censor,
            day: Some(day),
            follow_up_event: None,
        }
    }

    fn death(day: i32) -> OutcomeMeasure {
        OutcomeMeasure {
            kind: OutcomeKind::Death,
            day: Some(day),
            follow_up_event: None,
        }
    }

    fn progressions(days: &[i32]) -> Vec<OutcomeMeasure> {
        days.iter().map(|d| progression(Some(*d))).collect()
    }

    fn outcome(days: i32, had_event: bool) -> PfsOutcome {
        PfsOutcome {
            days: Some(days),
            had_event: Some(had_event),
        }
    }

    fn determine(measures: &[OutcomeMeasure]) -> PfsOutcome {
        OutcomeInterpreter::determine(Some(1), Some(7), measures)
    }

    #[test]
    fn test_nothing_after_plan_start() {
        assert_eq!(determine(&progressions(&[0])), PfsOutcome::unknown());
        assert_eq!(determine(&[]), PfsOutcome::unknown());
    }

    #[test]
    fn test_missing_day_invalidates_series() {
        let measures = vec![progression(Some(5)), progression(None)];
        assert_eq!(determine(&measures), PfsOutcome::unknown());
    }

    #[test]
    fn test_single_measure() {
        assert_eq!(determine(&[censor(50)]), outcome(49, false));
        assert_eq!(determine(&progressions(&[50])), outcome(49, true));
        assert_eq!(determine(&[death(30)]), outcome(29, true));
    }

    #[test]
    fn test_multiple_progressions_use_first_after_plan_stop() {
        assert_eq!(determine(&progressions(&[5, 10])), outcome(9, true));
        assert_eq!(determine(&progressions(&[12, 16])), outcome(11, true));
        assert_eq!(determine(&progressions(&[4, 20, 21])), outcome(19, true));
    }

    #[test]
    fn test_multiple_progressions_before_plan_stop_use_latest() {
        assert_eq!(determine(&progressions(&[2, 4])), outcome(3, true));
        assert_eq!(determine(&progressions(&[2, 4, 6])), outcome(5, true));
    }

    #[test]
    fn test_multiple_measures_need_plan_stop() {
        let result = OutcomeInterpreter::determine(Some(1), None, &progressions(&[4, 20]));
        assert_eq!(result, PfsOutcome::unknown());
    }

    #[test]
    fn test_single_measure_without_plan_stop() {
        let result = OutcomeInterpreter::determine(Some(5), None, &progressions(&[50]));
        assert_eq!(result, outcome(45, true));
        let result = OutcomeInterpreter::determine(Some(5), None, &progressions(&[10, 50]));
        assert_eq!(result, PfsOutcome::unknown());
    }

    #[test]
    fn test_window_from_day_five() {
        let window = |measures: &[OutcomeMeasure]| OutcomeInterpreter::determine(Some(5), Some(20), measures);
        assert_eq!(window(&progressions(&[4])), PfsOutcome::unknown());
        assert_eq!(window(&[censor(50)]), outcome(45, false));
        assert_eq!(window(&progressions(&[50])), outcome(45, true));
        assert_eq!(window(&progressions(&[2, 6, 22, 25])), outcome(17, true));
        assert_eq!(window(&progressions(&[2, 6, 14, 18])), outcome(13, true));
    }

    #[test]
    fn test_censor_among_several_is_invalid() {
        let measures = vec![censor(2), progression(Some(6)), progression(Some(22))];
        let result = OutcomeInterpreter::determine(Some(5), Some(20), &measures);
        assert_eq!(result, PfsOutcome::unknown());

        let measures = vec![censor(6), progression(Some(18))];
        let result = OutcomeInterpreter::determine(Some(5), Some(20), &measures);
        assert_eq!(result, PfsOutcome::unknown());
    }

    #[test]
    fn test_death_must_be_last() {
        let measures = vec![death(10), progression(Some(30))];
        assert_eq!(determine(&measures), PfsOutcome::unknown());

        let measures = vec![progression(Some(3)), death(30)];
        assert_eq!(determine(&measures), outcome(29, true));
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_day() {
        assert_eq!(determine(&progressions(&[21, 4, 20])), outcome(19, true));
    }

    #[test]
    fn test_no_plan_start() {
        let result = OutcomeInterpreter::determine(None, Some(7), &progressions(&[10]));
        assert_eq!(result, PfsOutcome::unknown());
    }
}
