use crate::genmoves::GenmovesOutcome;

/// The `winrate` chat sub-interface reply (spec §6): reports the last
/// committed move's aggregated stats in prose.
pub fn winrate(outcome: &GenmovesOutcome) -> String {
    format!(
        "In {} playouts at {} machines, {} {} can win with {:.2}% probability.",
        outcome.total_playouts,
        outcome.machines,
        outcome.color,
        outcome.best,
        outcome.best_stats.value * 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Color;
    use crate::coord::Coord;
    use crate::genmoves::MoveStats;

    #[test]
    fn formats_the_winrate_sentence() {
        let outcome = GenmovesOutcome {
            color: Color::Black,
            best: Coord::from("A1"),
            best_stats: MoveStats {
                playouts: 110,
                value: 0.622_727,
                playouts_amaf: 90,
                value_amaf: 0.58,
            },
            total_playouts: 180,
            threads: 8,
            machines: 2,
        };
        assert_eq!(
            winrate(&outcome),
            "In 180 playouts at 2 machines, b A1 can win with 62.27% probability."
        );
    }
}
