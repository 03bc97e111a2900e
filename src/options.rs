use crate::ConfigError;

/// Default timeout and retry policy applied to every call that does not
/// override it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base retry backoff in milliseconds, doubled on each retry.
    pub retry_base_delay_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
        }
    }
}

impl ClientOptions {
    /// Rejects zero timeout or zero base delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration { field: "timeout_ms" });
        }
        if self.retry_base_delay_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "retry_base_delay_ms",
            });
        }
        Ok(())
    }

    /// Builds options from `API_TIMEOUT_MS`, `API_MAX_RETRIES` and
    /// `API_RETRY_DELAY_MS`, keeping the default for any unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut opts = Self::default();
        if let Some(value) = parse_var(&lookup, "API_TIMEOUT_MS")? {
            opts.timeout_ms = value;
        }
        if let Some(value) = parse_var(&lookup, "API_MAX_RETRIES")? {
            opts.max_retries = value;
        }
        if let Some(value) = parse_var(&lookup, "API_RETRY_DELAY_MS")? {
            opts.retry_base_delay_ms = value;
        }
        opts.validate()?;
        Ok(opts)
    }
}

fn parse_var<F, N>(lookup: &F, name: &'static str) -> Result<Option<N>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    N: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::ClientOptions;
    use crate::ConfigError;

    #[test]
    fn defaults_match_documented_policy() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout_ms, 10_000);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.retry_base_delay_ms, 1_000);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let opts = ClientOptions {
            timeout_ms: 0,
            ..ClientOptions::default()
        };
        assert!(matches!(
            opts.validate(),
            Err(ConfigError::ZeroDuration { field: "timeout_ms" })
        ));
    }

    #[test]
    fn zero_base_delay_is_rejected() {
        let opts = ClientOptions {
            retry_base_delay_ms: 0,
            ..ClientOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let opts = ClientOptions::from_lookup(|name| match name {
            "API_TIMEOUT_MS" => Some("2500".to_owned()),
            "API_MAX_RETRIES" => Some(" 5 ".to_owned()),
            _ => None,
        })
        .expect("must parse");
        assert_eq!(opts.timeout_ms, 2_500);
        assert_eq!(opts.max_retries, 5);
        assert_eq!(opts.retry_base_delay_ms, 1_000);
    }

    #[test]
    fn lookup_rejects_garbage() {
        let err = ClientOptions::from_lookup(|name| {
            (name == "API_MAX_RETRIES").then(|| "-1".to_owned())
        })
        .expect_err("negative retries must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                name: "API_MAX_RETRIES",
                ..
            }
        ));
    }
}
