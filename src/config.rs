use crate::error::EngineError;

/// Engine configuration (spec §6): a comma-separated `key=value` string.
///
/// ```text
/// slave_port=1234,max_slaves=16,slaves_quit=1
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub slave_port: u16,
    pub proxy_port: Option<u16>,
    pub max_slaves: usize,
    pub slaves_quit: bool,
}

const DEFAULT_MAX_SLAVES: usize = 100;

impl Config {
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let mut slave_port = None;
        let mut proxy_port = None;
        let mut max_slaves = DEFAULT_MAX_SLAVES;
        let mut slaves_quit = false;

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                EngineError::Config(format!("expected key=value, found: {entry}"))
            })?;
            match key {
                "slave_port" => slave_port = Some(Self::parse_port(key, value)?),
                "proxy_port" => proxy_port = Some(Self::parse_port(key, value)?),
                "max_slaves" => {
                    max_slaves = value
                        .parse()
                        .map_err(|_| EngineError::Config(format!("invalid max_slaves: {value}")))?
                }
                "slaves_quit" => slaves_quit = Self::parse_bool(value)?,
                other => {
                    return Err(EngineError::Config(format!("unrecognized config key: {other}")));
                }
            }
        }

        Ok(Config {
            slave_port: slave_port
                .ok_or_else(|| EngineError::Config("slave_port is required".to_string()))?,
            proxy_port,
            max_slaves,
            slaves_quit,
        })
    }

    fn parse_port(key: &str, value: &str) -> Result<u16, EngineError> {
        value
            .parse()
            .map_err(|_| EngineError::Config(format!("invalid {key}: {value}")))
    }

    fn parse_bool(value: &str) -> Result<bool, EngineError> {
        match value {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(EngineError::Config(format!(
                "expected 0 or 1 for slaves_quit, found: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = Config::parse("slave_port=1234").unwrap();
        assert_eq!(config.slave_port, 1234);
        assert_eq!(config.proxy_port, None);
        assert_eq!(config.max_slaves, DEFAULT_MAX_SLAVES);
        assert!(!config.slaves_quit);
    }

    #[test]
    fn parses_full_config() {
        let config = Config::parse("slave_port=1234,proxy_port=1235,max_slaves=8,slaves_quit=1")
            .unwrap();
        assert_eq!(config.slave_port, 1234);
        assert_eq!(config.proxy_port, Some(1235));
        assert_eq!(config.max_slaves, 8);
        assert!(config.slaves_quit);
    }

    #[test]
    fn missing_slave_port_is_a_config_error() {
        assert!(matches!(
            Config::parse("max_slaves=8"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn unrecognized_key_is_a_config_error() {
        assert!(matches!(
            Config::parse("slave_port=1234,bogus=1"),
            Err(EngineError::Config(_))
        ));
    }
}
