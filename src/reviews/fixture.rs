use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::ReviewSource;

const REVIEWS: [&str; 10] = [
    "Absolutely blazing fast. I run the latest AAA games on ultra at 1440p and it never drops below 120fps. The 240Hz screen is gorgeous.",
    "Performance is top notch but the fans get really loud under load. You will want headphones if you game in a quiet room.",
    "Battery life is terrible. I get maybe 2.5 hours of light browsing, so this is a desktop replacement, not a laptop you carry around.",
    "Build quality feels premium. The aluminum lid is solid and the keyboard is one of the best I have used on a gaming laptop.",
    "Runs hot. The keyboard deck near the WASD keys gets uncomfortably warm after an hour of gaming.",
    "The display is the highlight for me: bright, accurate colors and no noticeable backlight bleed on my unit.",
    "Lenovo Vantage is bloated and kept resetting my fan profile after every update. Had to uninstall half the preinstalled software.",
    "Heavy and the power brick is huge. Definitely not something you throw in a backpack every day.",
    "Great value compared to similar machines from other brands. The RGB keyboard and port selection are excellent.",
    "Customer support was slow when my trackpad started double clicking. Took three weeks to get a replacement part.",
];

/// Serves the fixed demo review list regardless of the identifier.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    delay: Duration,
}

impl FixtureSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn reviews() -> Vec<String> {
        REVIEWS.iter().map(|r| r.to_string()).collect()
    }
}

#[async_trait]
impl ReviewSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch(&self, identifier: &str) -> Vec<String> {
        info!(identifier, delay_ms = self.delay.as_millis() as u64, "serving fixture reviews");
        // Simulated scrape latency
        tokio::time::sleep(self.delay).await;
        Self::reviews()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn returns_ten_reviews_after_the_delay() {
        let source = FixtureSource::new(Duration::from_millis(1500));
        let started = Instant::now();
        let reviews = source.fetch("B0BX4B4158").await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(reviews.len(), 10);
        assert_eq!(reviews, FixtureSource::reviews());
    }

    #[tokio::test]
    async fn ignores_the_identifier() {
        let source = FixtureSource::new(Duration::ZERO);
        let a = source.fetch("B0BX4B4158").await;
        let b = source.fetch("does-not-exist").await;
        assert_eq!(a, b);
        assert!(a[0].starts_with("Absolutely blazing fast"));
        assert!(a[9].starts_with("Customer support"));
    }
}
