use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One short line per event on the terminal.
    Compact,
    /// One JSON object per event, no timestamp (CloudWatch adds its own).
    Json,
}

/// Directives used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "iot_ingest=debug,lambda=debug,info"
    } else {
        "iot_ingest=info,lambda=info,warn"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init(format: LogFormat, verbose: bool) {
    let base = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(env_filter(verbose));
    match format {
        LogFormat::Compact => registry.with(base.compact()).init(),
        LogFormat::Json => registry.with(base.without_time().json()).init(),
    }
}

pub fn init_cli_logger(verbose: bool) {
    init(LogFormat::Compact, verbose);
}

/// Lambda 執行環境：JSON 格式，交由 CloudWatch 解析
pub fn init_lambda_logger() {
    init(LogFormat::Json, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [false, true] {
            let filter = EnvFilter::try_new(default_directives(verbose));
            assert!(filter.is_ok(), "bad directives for verbose={}", verbose);
        }
        assert!(default_directives(true).contains("iot_ingest=debug"));
        assert!(default_directives(false).contains("iot_ingest=info"));
    }
}
