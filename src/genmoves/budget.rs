use std::time::Duration;

use tokio::time::Instant;

/// The search budget for one genmoves loop (spec §4.5 "Inputs"): either a
/// wall-clock allowance or a total-playouts target, never both.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Budget {
    WallTime(Duration),
    Playouts(u64),
}

impl Budget {
    /// Step e of the loop: whether the search should stop given the
    /// elapsed wall time and the cumulative played-out count so far.
    /// `keep_looking` already folds in the majority vote; this only
    /// covers the budget half of the exit condition.
    pub fn exhausted(&self, started_at: Instant, played_total: u64) -> bool {
        match self {
            Budget::WallTime(worst) => started_at.elapsed() >= *worst,
            Budget::Playouts(worst) => played_total >= *worst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wall_time_budget_is_exhausted_once_elapsed() {
        tokio::time::pause();
        let start = Instant::now();
        let budget = Budget::WallTime(Duration::from_millis(100));
        assert!(!budget.exhausted(start, 0));
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(budget.exhausted(start, 0));
    }

    #[test]
    fn playouts_budget_is_exhausted_once_target_reached() {
        let start = Instant::now();
        let budget = Budget::Playouts(1000);
        assert!(!budget.exhausted(start, 950));
        assert!(budget.exhausted(start, 1000));
        assert!(budget.exhausted(start, 1250));
    }
}
