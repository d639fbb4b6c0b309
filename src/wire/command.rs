use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;

use crate::error::EngineError;

use super::is_multiline_verb;

/// An ordered command record `(id, verb, body)` (spec §3).
///
/// `body[0]` is the argument text that shares the header line with
/// `id`/`verb`; `body[1..]` are continuation lines used only by verbs
/// whose payload format requires them (currently the genmoves family).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub id: u64,
    pub verb: String,
    pub body: Vec<String>,
}

impl Command {
    pub fn new(id: u64, verb: impl Into<String>, argline: impl Into<String>) -> Self {
        Command {
            id,
            verb: verb.into(),
            body: vec![argline.into()],
        }
    }

    pub fn with_lines(id: u64, verb: impl Into<String>, body: Vec<String>) -> Self {
        Command {
            id,
            verb: verb.into(),
            body,
        }
    }

    pub fn argline(&self) -> &str {
        self.body.first().map(String::as_str).unwrap_or("")
    }

    pub fn continuation(&self) -> &[String] {
        self.body.get(1..).unwrap_or(&[])
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        let head = self.argline();
        if head.is_empty() {
            out.push_str(&format!("{} {}\n", self.id, self.verb));
        } else {
            out.push_str(&format!("{} {} {}\n", self.id, self.verb, head));
        }
        for line in self.continuation() {
            out.push_str(line);
            out.push('\n');
        }
        if is_multiline_verb(&self.verb) {
            out.push('\n');
        }
        out
    }
}

/// Reads one `Command` off an async line source, honoring the blank-line
/// terminator for multi-line verbs. Returns `Ok(None)` at EOF.
pub async fn read_command<R>(reader: &mut R) -> Result<Option<Command>, EngineError>
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
    let mut parts = header.splitn(3, ' ');
    let id: u64 = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EngineError::Parse(format!("missing command id: {header:?}")))?
        .parse()
        .map_err(|_| EngineError::Parse(format!("non-numeric command id: {header:?}")))?;
    let verb = parts
        .next()
        .ok_or_else(|| EngineError::Parse(format!("missing verb: {header:?}")))?
        .to_string();
    let argline = parts.next().unwrap_or("").to_string();

    let mut body = vec![argline];
    if is_multiline_verb(&verb) {
        loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .await
                .map_err(EngineError::Transport)?;
            if n == 0 {
                break; // connection closed mid-body; treat what we have as final
            }
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                break;
            }
            body.push(line.to_string());
        }
    }

    Ok(Some(Command { id, verb, body }))
}
