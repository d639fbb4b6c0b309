use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;

/// Optional fan-in of slave diagnostic log streams onto the master's own
/// stderr (spec §2 "Proxy (optional)"). Each connection is just lines of
/// text; there is no command/reply framing here, unlike the slave wire
/// protocol.
pub async fn serve(listener: TcpListener) {
    let next_id = AtomicU64::new(1);
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("proxy accept failed: {e}");
                continue;
            }
        };
        let id = next_id.fetch_add(1, Ordering::Relaxed);
        log::info!("proxy connection {id} from {addr}");
        tokio::spawn(async move {
            let mut reader = BufReader::new(socket);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let trimmed = line.trim_end_matches(['\n', '\r']);
                        if !trimmed.is_empty() {
                            log::info!("[slave {id}] {trimmed}");
                        }
                    }
                }
            }
            log::info!("proxy connection {id} closed");
        });
    }
}
