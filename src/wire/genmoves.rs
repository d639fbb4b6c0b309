use crate::coord::Color;
use crate::coord::Coord;
use crate::error::EngineError;

use super::Command;
use super::Reply;
use super::format_value;

/// Byoyomi/main-time settings carried on the genmoves args line (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSettings {
    pub main_time: f64,
    pub byoyomi_time: f64,
    pub byoyomi_periods: u32,
    pub byoyomi_stones: u32,
}

/// One `coord playouts value amaf_playouts amaf_value` line: either a
/// prior-stat sent to a slave, or a per-child stat line in a reply.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildStat {
    pub coord: Coord,
    pub playouts: u64,
    pub value: f64,
    pub playouts_amaf: u64,
    pub value_amaf: f64,
}

impl ChildStat {
    fn encode(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.coord,
            self.playouts,
            format_value(self.value),
            self.playouts_amaf,
            format_value(self.value_amaf)
        )
    }

    fn parse(line: &str) -> Result<Self, EngineError> {
        let mut parts = line.split_whitespace();
        let fail = || EngineError::Parse(format!("malformed child stat line: {line:?}"));
        let coord = Coord::from(parts.next().ok_or_else(fail)?);
        let playouts = parts.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        let value = parts.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        let playouts_amaf = parts.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        let value_amaf = parts.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        Ok(ChildStat {
            coord,
            playouts,
            value,
            playouts_amaf,
            value_amaf,
        })
    }
}

/// The args of a `pachi-genmoves`/`pachi-genmoves_cleanup` command
/// (spec §4.1): `color played [time settings]` followed by prior-stat lines.
#[derive(Clone, Debug, PartialEq)]
pub struct GenmovesRequest {
    pub color: Color,
    pub played: Coord,
    pub time: Option<TimeSettings>,
    pub priors: Vec<ChildStat>,
}

impl GenmovesRequest {
    pub fn into_command(self, id: u64, cleanup: bool) -> Command {
        let verb = if cleanup {
            super::GENMOVES_CLEANUP
        } else {
            super::GENMOVES
        };
        let mut head = format!("{} {}", self.color, self.played);
        if let Some(t) = self.time {
            head.push_str(&format!(
                " {} {} {} {}",
                t.main_time, t.byoyomi_time, t.byoyomi_periods, t.byoyomi_stones
            ));
        }
        let mut body = vec![head];
        body.extend(self.priors.iter().map(ChildStat::encode));
        Command::with_lines(id, verb, body)
    }

    pub fn from_command(cmd: &Command) -> Result<Self, EngineError> {
        let mut fields = cmd.argline().split_whitespace();
        let fail = || EngineError::Parse(format!("malformed genmoves args: {:?}", cmd.argline()));
        let color = fields
            .next()
            .ok_or_else(fail)?
            .parse()
            .map_err(|_| fail())?;
        let played = Coord::from(fields.next().ok_or_else(fail)?);
        let rest: Vec<&str> = fields.collect();
        let time = match rest.len() {
            0 => None,
            4 => Some(TimeSettings {
                main_time: rest[0].parse().map_err(|_| fail())?,
                byoyomi_time: rest[1].parse().map_err(|_| fail())?,
                byoyomi_periods: rest[2].parse().map_err(|_| fail())?,
                byoyomi_stones: rest[3].parse().map_err(|_| fail())?,
            }),
            _ => return Err(fail()),
        };
        let priors = cmd
            .continuation()
            .iter()
            .map(|l| ChildStat::parse(l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GenmovesRequest {
            color,
            played,
            time,
            priors,
        })
    }
}

/// The reply to a genmoves command (spec §4.1):
/// `played_own total_playouts threads keep_looking` followed by per-child
/// stat lines.
#[derive(Clone, Debug, PartialEq)]
pub struct GenmovesReply {
    pub played_own: u64,
    pub total_playouts: u64,
    pub threads: u32,
    pub keep_looking: bool,
    pub children: Vec<ChildStat>,
}

impl GenmovesReply {
    pub fn into_reply(self, id: u64) -> Reply {
        let head = format!(
            "{} {} {} {}",
            self.played_own,
            self.total_playouts,
            self.threads,
            if self.keep_looking { 1 } else { 0 }
        );
        let mut payload = vec![head];
        payload.extend(self.children.iter().map(ChildStat::encode));
        Reply::success(id, payload)
    }

    pub fn from_reply(reply: &Reply) -> Result<Self, EngineError> {
        if !reply.ok {
            return Err(EngineError::Parse(format!(
                "expected success reply, got failure: {:?}",
                reply.payload
            )));
        }
        let head = reply.payload.first().map(String::as_str).unwrap_or("");
        let mut fields = head.split_whitespace();
        let fail = || EngineError::Parse(format!("malformed genmoves reply header: {head:?}"));
        let played_own = fields.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        let total_playouts = fields.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        let threads = fields.next().ok_or_else(fail)?.parse().map_err(|_| fail())?;
        let keep_looking = match fields.next().ok_or_else(fail)? {
            "0" => false,
            "1" => true,
            _ => return Err(fail()),
        };
        let children = reply
            .payload
            .get(1..)
            .unwrap_or(&[])
            .iter()
            .map(|l| ChildStat::parse(l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GenmovesReply {
            played_own,
            total_playouts,
            threads,
            keep_looking,
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_genmoves_request_with_priors() {
        let req = GenmovesRequest {
            color: Color::Black,
            played: Coord::pass(),
            time: Some(TimeSettings {
                main_time: 0.0,
                byoyomi_time: 30.0,
                byoyomi_periods: 1,
                byoyomi_stones: 0,
            }),
            priors: vec![ChildStat {
                coord: Coord::from("A1"),
                playouts: 60,
                value: 0.6,
                playouts_amaf: 50,
                value_amaf: 0.55,
            }],
        };
        let cmd = req.clone().into_command(1, false);
        assert_eq!(cmd.verb, super::super::GENMOVES);
        let parsed = GenmovesRequest::from_command(&cmd).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn round_trips_genmoves_reply_with_children() {
        let reply = GenmovesReply {
            played_own: 10,
            total_playouts: 100,
            threads: 4,
            keep_looking: true,
            children: vec![ChildStat {
                coord: Coord::from("A1"),
                playouts: 60,
                value: 0.6,
                playouts_amaf: 50,
                value_amaf: 0.55,
            }],
        };
        let wire = reply.clone().into_reply(1);
        let parsed = GenmovesReply::from_reply(&wire).unwrap();
        assert_eq!(parsed, reply);
    }

    #[test]
    fn keep_looking_false_round_trips() {
        let reply = GenmovesReply {
            played_own: 1,
            total_playouts: 1,
            threads: 1,
            keep_looking: false,
            children: vec![],
        };
        let parsed = GenmovesReply::from_reply(&reply.clone().into_reply(1)).unwrap();
        assert!(!parsed.keep_looking);
    }
}
