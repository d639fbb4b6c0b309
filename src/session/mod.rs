//! One task per connected slave (spec §4.2): reads the next unsent or
//! refreshed command off the registry, transmits it, and waits for the
//! matching reply before advancing. Modeled on the teacher's
//! one-task-per-room shape (`hosting/casino.rs::bridge`), with the
//! room's channel pair replaced by a socket split over the line-framed
//! wire codec.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpStream;

use crate::error::EngineError;
use crate::protocol::Protocol;
use crate::slave_table::SlaveId;
use crate::slave_table::SlaveTable;
use crate::wire::Command;
use crate::wire::read_reply;

/// Runs a slave connection to completion, deregistering it on exit
/// whatever the cause — a clean disconnect is not fatal to the master
/// (spec §4.2 "Disconnect policy").
pub async fn run(socket: TcpStream, slave_id: SlaveId, protocol: Arc<Protocol>, slaves: Arc<SlaveTable>) {
    slaves.insert(slave_id).await;
    log::info!("slave {slave_id} connected");

    if let Err(e) = serve(socket, slave_id, &protocol, &slaves).await {
        log::warn!("slave {slave_id} session ended: {e}");
    }

    slaves.remove(slave_id).await;
    protocol.forget_slave(slave_id).await;
    log::info!("slave {slave_id} disconnected");
}

/// There is no explicit `awaiting_resync` state to track: every fresh
/// connection — first contact or reconnect — starts `(last_id,
/// last_generation)` at `(0, 0)`, so a reconnecting slave naturally
/// replays the full command history before catching up to the live tail
/// (spec §8 scenario 6). Slaves are stateless across reconnects; the
/// registry is the only source of truth.
///
/// A successful reply does *not* unconditionally advance past its id:
/// the next call to `await_update` re-evaluates the registry tail, so a
/// `replace_last` prior-stats refresh published under the same id (spec
/// §4.3/§4.5 step 2f) is resent and its reply accepted, and only an
/// actual tail append (a new or superseding command) moves the session
/// to a new id.
async fn serve(
    socket: TcpStream,
    slave_id: SlaveId,
    protocol: &Protocol,
    slaves: &SlaveTable,
) -> Result<(), EngineError> {
    let (read_half, mut writer) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut last_id = 0u64;
    let mut last_generation = 0u64;

    loop {
        let entry = protocol.await_update(last_id, last_generation).await;
        let cmd = Command::with_lines(entry.id, entry.verb.clone(), entry.body.clone());
        writer.write_all(cmd.encode().as_bytes()).await?;
        last_id = entry.id;
        last_generation = entry.generation;

        let reply = match read_reply(&mut reader).await? {
            Some(reply) => reply,
            None => return Ok(()), // clean EOF
        };

        if reply.id != entry.id {
            // Out-of-order or stale reply: discarded silently (spec §5
            // "Ordering guarantees").
            continue;
        }

        if !reply.ok {
            // Slave reports a diverged position (e.g. "?id unknown
            // position"); resync from the start of history (spec §4.2).
            log::warn!(
                "slave {slave_id} reported divergence at id {}: {:?}",
                reply.id,
                reply.payload
            );
            last_id = 0;
            last_generation = 0;
            slaves.update(slave_id, entry.id, 0).await;
            continue;
        }

        protocol.record_reply(slave_id, entry.id, reply).await;
        slaves.update(slave_id, entry.id, entry.id).await;
    }
}
