use anyhow::Result;
use byte_unit::{Byte, UnitType};
use colored::*;
use tiktoken_rs::cl100k_base;
use ctx_core::{AppError, MetricsConfig, ResolvedFile};

#[derive(Debug)]
pub struct AuditMetrics {
    pub total_files: usize,
    pub total_chars: usize,
    pub total_bytes: usize,
    pub total_bytes_readable: String,
    pub estimated_tokens: usize,
    pub exact_tokens: bool,
}

pub fn calculate_metrics(files: &[ResolvedFile], exact_tokens: bool) -> Result<AuditMetrics> {
    let total_chars: usize = files.iter().map(|f| f.content.chars().count()).sum();
    let total_bytes: usize = files.iter().map(|f| f.content.len()).sum();

    let estimated_tokens = if exact_tokens {
        let bpe = cl100k_base().map_err(|e| AppError::TikToken(e.to_string()))?;
        files
            .iter()
            .map(|f| bpe.encode_ordinary(&f.content).len())
            .sum()
    } else {
        // Roughly four characters per token for source code.
        total_chars / 4
    };

    let total_bytes_readable = Byte::from_u128(total_bytes as u128)
        .unwrap_or_default()
        .get_appropriate_unit(UnitType::Binary)
        .to_string();

    Ok(AuditMetrics {
        total_files: files.len(),
        total_chars,
        total_bytes,
        total_bytes_readable,
        estimated_tokens,
        exact_tokens,
    })
}

/// Writes the summary to stderr. The threshold warning is shown even when
/// quiet, since it is the one thing a piped run cannot otherwise notice.
pub fn print_metrics(metrics: &AuditMetrics, config: &MetricsConfig, quiet: bool) {
    if !quiet {
        eprintln!();
        eprintln!(
            "{} Scanned {} files ({}).",
            "[Audit Ready]".green(),
            metrics.total_files.to_string().cyan(),
            metrics.total_bytes_readable
        );
        eprintln!(
            "{} {} Tokens: {}",
            "[Audit Ready]".green(),
            if metrics.exact_tokens { "Exact" } else { "Approx" },
            metrics.estimated_tokens.to_string().cyan()
        );
    }
    if metrics.estimated_tokens > config.token_warning_threshold {
        eprintln!(
            "{} Output exceeds {} tokens.",
            "WARNING:".yellow().bold(),
            config.token_warning_threshold
        );
    }
}
