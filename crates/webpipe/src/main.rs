mod exit;
mod logging;

use std::io;

use clap::Parser;
use webpipe::codec::WebpCodec;
use webpipe::frame::{FrameConfig, DEFAULT_MAX_LINE, DEFAULT_MAX_PAYLOAD};
use webpipe::session::{Session, SessionConfig};

use crate::exit::{CliError, CliResult};
use crate::logging::{init_logging, LogFormat, LogLevel};

/// Serve WebP requests on stdin, answering on stdout.
///
/// None of the options change the protocol; running with no arguments is the
/// normal mode.
#[derive(Parser, Debug)]
#[command(
    name = "webpipe",
    version,
    about = "WebP codec gateway over stdin/stdout"
)]
struct Cli {
    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        env = "WEBPIPE_LOG_FORMAT",
        default_value = "text"
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "WEBPIPE_LOG_LEVEL",
        default_value = "info"
    )]
    log_level: LogLevel,

    /// Largest accepted blob payload in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        env = "WEBPIPE_MAX_PAYLOAD",
        default_value_t = DEFAULT_MAX_PAYLOAD
    )]
    max_payload: usize,

    /// Longest accepted request line in bytes, including the newline.
    #[arg(
        long,
        value_name = "BYTES",
        env = "WEBPIPE_MAX_LINE",
        default_value_t = DEFAULT_MAX_LINE
    )]
    max_line: usize,
}

impl Cli {
    fn session_config(&self) -> CliResult<SessionConfig> {
        if self.max_line == 0 {
            return Err(CliError::new(exit::USAGE, "--max-line must be at least 1"));
        }
        Ok(SessionConfig {
            frame: FrameConfig {
                max_payload_size: self.max_payload,
                max_line_length: self.max_line,
            },
            ..SessionConfig::default()
        })
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit::USAGE
            } else {
                exit::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    match serve(&cli) {
        Ok(()) => std::process::exit(exit::SUCCESS),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn serve(cli: &Cli) -> CliResult<()> {
    let config = cli.session_config()?;
    tracing::info!(
        pid = std::process::id(),
        max_payload = config.frame.max_payload_size,
        max_line = config.frame.max_line_length,
        "webpipe ready"
    );

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let stats = Session::with_config(stdin, stdout, WebpCodec::new(), config)
        .run()
        .map_err(exit::session_error)?;

    tracing::info!(
        requests = stats.requests,
        failed = stats.failed,
        skipped_lines = stats.skipped_lines,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        "session finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_no_arguments() {
        let cli = Cli::try_parse_from(["webpipe"]).expect("no args should parse");
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.log_level, LogLevel::Info);

        let config = cli.session_config().expect("defaults are valid");
        assert_eq!(config.frame.max_payload_size, DEFAULT_MAX_PAYLOAD);
        assert_eq!(config.frame.max_line_length, DEFAULT_MAX_LINE);
    }

    #[test]
    fn parses_diagnostic_flags() {
        let cli = Cli::try_parse_from([
            "webpipe",
            "--log-format",
            "json",
            "--log-level",
            "debug",
            "--max-payload",
            "1024",
            "--max-line",
            "128",
        ])
        .expect("flags should parse");

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level, LogLevel::Debug);
        let config = cli.session_config().unwrap();
        assert_eq!(config.frame.max_payload_size, 1024);
        assert_eq!(config.frame.max_line_length, 128);
    }

    #[test]
    fn rejects_unknown_arguments() {
        let err = Cli::try_parse_from(["webpipe", "decode"]).expect_err("positional should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn zero_line_limit_is_usage_error() {
        let cli = Cli::try_parse_from(["webpipe", "--max-line", "0"]).unwrap();
        let err = cli.session_config().unwrap_err();
        assert_eq!(err.code, exit::USAGE);
    }
}
