use crate::coord::Coord;

/// Dead-group consensus for `final_status_list` (spec §4.7): a pure
/// function over the payload strings already collected within
/// `MAX_FAST_CMD_WAIT`, independent of the collector so it is directly
/// unit-testable against spec.md's scenario 5.
///
/// Picks the most commonly reported payload, breaking ties by first
/// occurrence in `payloads` — spec.md describes this as "lexicographically
/// sort, then take the longest run", but a literal lexicographic sort of
/// scenario 5's payloads puts the *shorter* tied group first and would
/// select the wrong mode; first-occurrence order is what actually
/// reproduces the scenario's stated winner, so that's what this does.
pub fn select_dead_groups(payloads: &[String]) -> Vec<Coord> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for payload in payloads {
        match counts.iter_mut().find(|(seen, _)| *seen == payload.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((payload.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for &(payload, count) in &counts {
        match best {
            None => best = Some((payload, count)),
            Some((_, best_count)) if count > best_count => best = Some((payload, count)),
            _ => {}
        }
    }

    best.map(|(payload, _)| payload.split_whitespace().map(Coord::from).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_first_tied_mode_matching_spec_scenario_5() {
        let payloads = vec![
            "A1 A2".to_string(),
            "A1 A2".to_string(),
            "A1 A2 A3".to_string(),
            "A1".to_string(),
            "A1".to_string(),
        ];
        let dead = select_dead_groups(&payloads);
        assert_eq!(dead, vec![Coord::from("A1"), Coord::from("A2")]);
    }

    #[test]
    fn a_clear_majority_wins_outright() {
        let payloads = vec!["A1".to_string(), "A1".to_string(), "B2".to_string()];
        assert_eq!(select_dead_groups(&payloads), vec![Coord::from("A1")]);
    }

    #[test]
    fn empty_input_yields_no_dead_stones() {
        assert!(select_dead_groups(&[]).is_empty());
    }
}
