//! Per-token pricing for text-generation providers

use serde::{Deserialize, Serialize};

const MICROS_PER_DOLLAR: f64 = 1_000_000.0;
const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Token pricing expressed per million tokens.
///
/// Prices are stored in micro-dollars so configuration round-trips without
/// float drift; cost calculations return USD as `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPricing {
    /// Price per 1M input tokens in micro-dollars
    pub input_per_million_micros: i64,
    /// Price per 1M output tokens in micro-dollars
    pub output_per_million_micros: i64,
}

impl TokenPricing {
    /// Create pricing from USD prices per million tokens
    pub fn per_million(input_usd: f64, output_usd: f64) -> Self {
        Self {
            input_per_million_micros: (input_usd * MICROS_PER_DOLLAR).round() as i64,
            output_per_million_micros: (output_usd * MICROS_PER_DOLLAR).round() as i64,
        }
    }

    /// Flat pricing where input and output tokens cost the same
    pub fn flat(usd_per_million: f64) -> Self {
        Self::per_million(usd_per_million, usd_per_million)
    }

    /// Input price per million tokens in USD
    pub fn input_per_million(&self) -> f64 {
        self.input_per_million_micros as f64 / MICROS_PER_DOLLAR
    }

    /// Output price per million tokens in USD
    pub fn output_per_million(&self) -> f64 {
        self.output_per_million_micros as f64 / MICROS_PER_DOLLAR
    }

    /// Cost in USD for the given token counts. Linear in both arguments.
    pub fn calculate_cost_usd(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input = input_tokens as f64 * self.input_per_million() / TOKENS_PER_MILLION;
        let output = output_tokens as f64 * self.output_per_million() / TOKENS_PER_MILLION;

        input + output
    }
}
