use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;

use crate::error::EngineError;

/// A reply mirroring GTP's `=id payload\n\n` / `?id payload\n\n` framing
/// (spec §4.1). `payload` may span multiple lines and is always
/// terminated by a blank line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub id: u64,
    pub ok: bool,
    pub payload: Vec<String>,
}

impl Reply {
    pub fn success(id: u64, payload: Vec<String>) -> Self {
        Reply {
            id,
            ok: true,
            payload,
        }
    }

    pub fn failure(id: u64, payload: Vec<String>) -> Self {
        Reply {
            id,
            ok: false,
            payload,
        }
    }

    pub fn encode(&self) -> String {
        let sigil = if self.ok { '=' } else { '?' };
        let mut out = String::new();
        let head = self.payload.first().map(String::as_str).unwrap_or("");
        if head.is_empty() {
            out.push_str(&format!("{sigil}{}\n", self.id));
        } else {
            out.push_str(&format!("{sigil}{} {head}\n", self.id));
        }
        for line in self.payload.iter().skip(1) {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// Reads one `Reply` off an async line source. Returns `Ok(None)` at EOF.
pub async fn read_reply<R>(reader: &mut R) -> Result<Option<Reply>, EngineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut header = String::new();
    let n = reader
        .read_line(&mut header)
        .await
        .map_err(EngineError::Transport)?;
    if n == 0 {
        return Ok(None);
    }
    let header = header.trim_end_matches(['\n', '\r']);
    let (ok, rest) = match header.chars().next() {
        Some('=') => (true, &header[1..]),
        Some('?') => (false, &header[1..]),
        _ => return Err(EngineError::Parse(format!("reply missing sigil: {header:?}"))),
    };
    let mut parts = rest.splitn(2, ' ');
    let id: u64 = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::Parse(format!("missing reply id: {header:?}")))?
        .parse()
        .map_err(|_| EngineError::Parse(format!("non-numeric reply id: {header:?}")))?;
    let first = parts.next().unwrap_or("").to_string();

    let mut payload = vec![first];
    loop {
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(EngineError::Transport)?;
        if n == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            break;
        }
        payload.push(line.to_string());
    }

    Ok(Some(Reply { id, ok, payload }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_success_reply() {
        let reply = Reply::success(1, vec!["10 100 4 1".to_string(), "A1 60 0.6000000".to_string()]);
        let encoded = reply.encode();
        assert!(encoded.ends_with("\n\n"));
        let mut cursor = Cursor::new(encoded.into_bytes());
        let parsed = read_reply(&mut cursor).await.unwrap().unwrap();
        assert_eq!(parsed, reply);
    }

    #[tokio::test]
    async fn round_trips_a_failure_reply() {
        let reply = Reply::failure(7, vec!["unknown position".to_string()]);
        let mut cursor = Cursor::new(reply.encode().into_bytes());
        let parsed = read_reply(&mut cursor).await.unwrap().unwrap();
        assert_eq!(parsed, reply);
        assert!(!parsed.ok);
    }

    #[tokio::test]
    async fn missing_sigil_is_a_parse_error() {
        let mut cursor = Cursor::new(b"1 ok\n\n".to_vec());
        assert!(matches!(
            read_reply(&mut cursor).await,
            Err(EngineError::Parse(_))
        ));
    }
}
