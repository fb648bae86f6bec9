//! Combined market report text

use crate::domain::{CryptoPrediction, MoonPhase};

/// Render the market analysis appended after a successful summary
pub fn build_market_report(moon_phase: &MoonPhase, prediction: &CryptoPrediction) -> String {
    [
        "📊 **MARKET ANALYSIS COMPLETE**".to_string(),
        String::new(),
        format!(
            "🌙 **Lunar Phase**: {} {}",
            moon_phase.phase, moon_phase.phase_emoji
        ),
        format!("📈 **Trend Prediction**: {}", prediction.trend.to_uppercase()),
        format!("🎯 **Confidence**: {}", prediction.confidence.to_uppercase()),
        String::new(),
        format!("**Analysis**: {}", prediction.reasoning),
        String::new(),
        format!("**Recommendation**: {}", prediction.recommendation),
        String::new(),
        "_Based on historical moon phase correlation with crypto markets and current market data._"
            .to_string(),
    ]
    .join("\n")
}
