use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::coord::Color;
use crate::coord::Coord;
use crate::protocol::Protocol;
use crate::reply_buffer::SlaveId;
use crate::slave_table::SlaveTable;
use crate::wire::GenmovesReply;
use crate::wire::GenmovesRequest;
use crate::wire::Reply;

use super::budget::Budget;
use super::stats::Aggregate;
use super::stats::MoveStats;

const STATS_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// The winning move and the aggregate stats behind it, kept for the chat
/// sub-interface (spec §6 `winrate`).
#[derive(Clone, Debug)]
pub struct GenmovesOutcome {
    pub color: Color,
    pub best: Coord,
    pub best_stats: MoveStats,
    pub total_playouts: u64,
    pub threads: u32,
    pub machines: usize,
}

/// Runs the genmoves loop (spec §4.5, "the central algorithm") to
/// completion and commits the winning move, returning the outcome for
/// the chat interface.
///
/// `played` is the opponent's last move (or `Coord::pass()` at game
/// start); `cleanup` selects `pachi-genmoves_cleanup` over
/// `pachi-genmoves`.
pub async fn run(
    protocol: &Protocol,
    slaves: &SlaveTable,
    color: Color,
    played: Coord,
    budget: Budget,
    cleanup: bool,
) -> GenmovesOutcome {
    let started_at = Instant::now();
    let initial = GenmovesRequest {
        color,
        played: played.clone(),
        time: None,
        priors: Vec::new(),
    };
    let search_id = protocol
        .append(
            if cleanup { "pachi-genmoves_cleanup" } else { "pachi-genmoves" },
            initial.into_command(0, cleanup).body,
        )
        .await;

    let mut aggregate = Aggregate::new();
    let mut threads = 0u32;
    let mut last_merged: HashMap<SlaveId, Reply> = HashMap::new();

    loop {
        let deadline = Instant::now() + STATS_UPDATE_INTERVAL;
        let snapshot =
            crate::collector::ReplyCollector::wait_until(protocol, slaves, search_id, deadline)
                .await;

        let mut keep_votes = (0u32, 0u32); // (keep, stop)
        for (slave, reply) in &snapshot {
            if last_merged.get(slave) == Some(reply) {
                continue;
            }
            if let Ok(parsed) = GenmovesReply::from_reply(reply) {
                aggregate.played_total += parsed.played_own;
                threads = threads.max(parsed.threads);
                for child in &parsed.children {
                    aggregate.merge_child(
                        child.coord.clone(),
                        child.playouts,
                        child.value,
                        child.playouts_amaf,
                        child.value_amaf,
                    );
                }
                if parsed.keep_looking {
                    keep_votes.0 += 1;
                } else {
                    keep_votes.1 += 1;
                }
            }
            last_merged.insert(*slave, reply.clone());
        }

        let keep_looking = keep_votes.0 > keep_votes.1;
        if !keep_looking || budget.exhausted(started_at, aggregate.played_total) {
            break;
        }

        let best = aggregate.best();
        if let Some(best) = best {
            let best_playouts = aggregate.get(&best).map(|s| s.playouts).unwrap_or(0);
            let priors = aggregate
                .significant_children(best_playouts)
                .into_iter()
                .map(|(coord, stats)| crate::wire::ChildStat {
                    coord,
                    playouts: stats.playouts,
                    value: stats.value,
                    playouts_amaf: stats.playouts_amaf,
                    value_amaf: stats.value_amaf,
                })
                .collect();
            let updated = GenmovesRequest {
                color,
                played: played.clone(),
                time: None,
                priors,
            };
            let verb = if cleanup { "pachi-genmoves_cleanup" } else { "pachi-genmoves" };
            let body = updated.into_command(search_id, cleanup).body;
            let _ = protocol.replace_last(verb, body).await;
        }
    }

    // Zero connected slaves at search time (spec §9 open question): a
    // reasonable contract is to pass with zero-playout stats.
    let (best, best_stats) = match aggregate.best() {
        Some(coord) => {
            let stats = *aggregate.get(&coord).unwrap();
            (coord, stats)
        }
        None => (Coord::pass(), MoveStats::default()),
    };

    protocol
        .supersede_last("play", vec![format!("{color} {best}")])
        .await;

    GenmovesOutcome {
        color,
        best,
        best_stats,
        total_playouts: aggregate.played_total,
        threads,
        machines: last_merged.len(),
    }
}
