use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufRead;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::chat;
use crate::collector::ReplyCollector;
use crate::config::Config;
use crate::coord::Color;
use crate::coord::Coord;
use crate::error::EngineError;
use crate::genmoves;
use crate::genmoves::Budget;
use crate::genmoves::GenmovesOutcome;
use crate::protocol::Protocol;
use crate::slave_table::SlaveTable;
use crate::status;
use crate::wire::Command;
use crate::wire::Reply;
use crate::wire::read_command;

/// Non-search commands broadcast to every slave wait no longer than this
/// for a quorum (spec §5 "Timeouts").
const MAX_FAST_CMD_WAIT: Duration = Duration::from_secs(1);

/// A generous, fixed per-move search allowance. Real GTP time management
/// (`time_left`, byoyomi bookkeeping) is an excluded external collaborator
/// (spec §1), and spec.md never names where the genmoves loop's `ti`
/// budget numerically comes from upstream, so a fixed wall-time budget
/// stands in (see DESIGN.md).
const DEFAULT_SEARCH_BUDGET: Duration = Duration::from_secs(5);

/// Upstream commands the master answers itself rather than forwarding
/// (spec §6). `genmove`/`kgs-genmove_cleanup`/`final_status_list` have
/// their own dedicated paths; the rest here are simply not broadcast.
const NOT_FORWARDED: &[&str] = &[
    "uct_genbook",
    "uct_dumpbook",
    "kgs-chat",
    "time_left",
    "final_score",
];

/// The root context tying the protocol lock, slave table, and config
/// together (spec §9 "tie their lifetime to an explicit context").
pub struct Master {
    config: Config,
    protocol: Arc<Protocol>,
    slaves: Arc<SlaveTable>,
    last_outcome: Mutex<Option<GenmovesOutcome>>,
}

impl Master {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Master {
            config,
            protocol: Arc::new(Protocol::new()),
            slaves: Arc::new(SlaveTable::new()),
            last_outcome: Mutex::new(None),
        })
    }

    /// Binds the slave and (optional) proxy listeners, then serves the
    /// upstream GTP dispatch loop on stdin/stdout until `quit`.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let slave_listener = TcpListener::bind(("0.0.0.0", self.config.slave_port))
            .await
            .map_err(EngineError::Transport)?;
        log::info!("listening for slaves on port {}", self.config.slave_port);

        let accept_handle = {
            let this = self.clone();
            tokio::spawn(async move { this.accept_slaves(slave_listener).await })
        };

        if let Some(proxy_port) = self.config.proxy_port {
            let proxy_listener = TcpListener::bind(("0.0.0.0", proxy_port))
                .await
                .map_err(EngineError::Transport)?;
            log::info!("listening for proxy log streams on port {proxy_port}");
            tokio::spawn(crate::proxy::serve(proxy_listener));
        }

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.dispatch_upstream(stdin, stdout).await?;

        accept_handle.abort();
        Ok(())
    }

    async fn accept_slaves(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (socket, addr) = match listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("slave accept failed: {e}");
                    continue;
                }
            };
            if self.slaves.connected_count().await >= self.config.max_slaves {
                log::warn!("rejecting slave at {addr}: max_slaves ({}) reached", self.config.max_slaves);
                continue;
            }
            let id = self.slaves.next_slave_id();
            tokio::spawn(crate::session::run(
                socket,
                id,
                self.protocol.clone(),
                self.slaves.clone(),
            ));
        }
    }

    async fn dispatch_upstream<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let cmd = match read_command(&mut reader).await {
                Ok(Some(cmd)) => cmd,
                Ok(None) => return Ok(()),
                Err(e) => {
                    log::warn!("malformed upstream command: {e}");
                    continue;
                }
            };
            let should_quit = cmd.verb == "quit";
            let reply = self.handle_upstream(cmd).await;
            writer.write_all(reply.encode().as_bytes()).await?;
            writer.flush().await?;
            if should_quit {
                return Ok(());
            }
        }
    }

    async fn handle_upstream(&self, cmd: Command) -> Reply {
        let verb = cmd.verb.clone();
        match verb.as_str() {
            "quit" => {
                if self.config.slaves_quit {
                    self.protocol.append("quit", vec![String::new()]).await;
                }
                Reply::success(cmd.id, vec![String::new()])
            }
            "genmove" => self.handle_genmove(cmd.id, cmd.argline(), false).await,
            "kgs-genmove_cleanup" => self.handle_genmove(cmd.id, cmd.argline(), true).await,
            "final_status_list" => self.handle_final_status_list(cmd.id).await,
            "kgs-chat" => self.handle_chat(cmd.id, cmd.argline()).await,
            v if NOT_FORWARDED.contains(&v) => Reply::success(cmd.id, vec![String::new()]),
            _ => self.broadcast_and_wait(cmd).await,
        }
    }

    async fn handle_genmove(&self, id: u64, argline: &str, cleanup: bool) -> Reply {
        let color: Color = match argline.split_whitespace().next().unwrap_or("").parse() {
            Ok(c) => c,
            Err(_) => return Reply::failure(id, vec!["invalid color".to_string()]),
        };
        let outcome = genmoves::run(
            &self.protocol,
            &self.slaves,
            color,
            Coord::pass(),
            Budget::WallTime(DEFAULT_SEARCH_BUDGET),
            cleanup,
        )
        .await;
        let best = outcome.best.clone();
        *self.last_outcome.lock().await = Some(outcome);
        Reply::success(id, vec![best.to_string()])
    }

    async fn handle_final_status_list(&self, id: u64) -> Reply {
        let search_id = self
            .protocol
            .append("final_status_list", vec![String::new()])
            .await;
        let deadline = Instant::now() + MAX_FAST_CMD_WAIT;
        let snapshot = ReplyCollector::wait_until(&self.protocol, &self.slaves, search_id, deadline).await;
        let payloads: Vec<String> = snapshot
            .into_iter()
            .map(|(_, reply)| reply.payload.first().cloned().unwrap_or_default())
            .collect();
        let dead = status::select_dead_groups(&payloads);
        let line = dead.iter().map(Coord::to_string).collect::<Vec<_>>().join(" ");
        Reply::success(id, vec![line])
    }

    async fn handle_chat(&self, id: u64, argline: &str) -> Reply {
        if argline.trim() == "winrate" {
            match self.last_outcome.lock().await.as_ref() {
                Some(outcome) => Reply::success(id, vec![chat::winrate(outcome)]),
                None => Reply::success(id, vec!["no search has run yet".to_string()]),
            }
        } else {
            Reply::success(id, vec![String::new()])
        }
    }

    async fn broadcast_and_wait(&self, cmd: Command) -> Reply {
        let id = cmd.id;
        let search_id = self.protocol.append(cmd.verb, cmd.body).await;
        let deadline = Instant::now() + MAX_FAST_CMD_WAIT;
        let snapshot = ReplyCollector::wait_until(&self.protocol, &self.slaves, search_id, deadline).await;
        match snapshot.into_iter().next() {
            Some((_, reply)) => Reply::success(id, reply.payload),
            None => Reply::success(id, vec![String::new()]),
        }
    }
}
