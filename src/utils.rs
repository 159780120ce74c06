use time::macros::format_description;
use tracing_subscriber::{fmt::time::LocalTime, EnvFilter};

/// `RUST_LOG` wins over the verbosity flag when set.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "histats=info" } else { "histats=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:3]"
        )))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn format_number(num: u32) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Mask every host label except the TLD, keep scheme and drop the rest.
/// Strings that are not URLs are masked entirely.
pub fn redact_url(raw: &str) -> String {
    let Ok(url) = url::Url::parse(raw) else {
        return "*".repeat(raw.chars().count().min(16));
    };
    match url.host_str() {
        Some(host) if !host.is_empty() => format!("{}://{}/…", url.scheme(), redact_domain(host)),
        _ => format!("{}:…", url.scheme()),
    }
}

pub fn redact_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() <= 1 {
        return domain.to_string();
    }

    if parts[parts.len() - 2].len() <= 3 {
        return format!("???.{}", parts[parts.len() - 1]);
    }

    let redacted_parts: Vec<String> = parts[..parts.len() - 1]
        .iter()
        .map(|part| "*".repeat(part.len()))
        .collect();

    let mut result = redacted_parts.join(".");
    result.push('.');
    result.push_str(parts[parts.len() - 1]);
    result
}

/// Horizontal bar scaled so that `max` spans `width` cells.
pub fn bar(value: u32, max: u32, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let cells = (value as u64 * width as u64).div_ceil(max as u64) as usize;
    "█".repeat(cells.min(width))
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if args.days == 0 {
        anyhow::bail!("--days must be greater than 0");
    }

    if args.max_results == 0 {
        anyhow::bail!("--max-results must be greater than 0");
    }

    if args.redact && !args.details {
        anyhow::bail!("--redact only applies together with --details");
    }

    Ok(())
}
