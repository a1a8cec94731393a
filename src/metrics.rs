#[derive(Debug, Clone)]
pub struct Metrics {
    pub cached_listings: prometheus::Gauge,
    pub pages_fetched: prometheus::Gauge,
    pub last_refresh: prometheus::Gauge,
    pub refresh_failures: prometheus::IntCounter,
    bid_attempts: prometheus::IntCounterVec,
}

impl Metrics {
    pub fn new(registry: &prometheus::Registry) -> Result<Self, prometheus::Error> {
        let cached_listings = prometheus::Gauge::new(
            "cached_listings",
            "The number of active listings held in the client cache",
        )?;
        registry.register(Box::new(cached_listings.clone()))?;

        let pages_fetched = prometheus::Gauge::new(
            "pages_fetched",
            "The number of API pages requested by the last refresh",
        )?;
        registry.register(Box::new(pages_fetched.clone()))?;

        let last_refresh =
            prometheus::Gauge::new("last_refresh", "The Unix Timestamp of the last refresh")?;
        registry.register(Box::new(last_refresh.clone()))?;

        let refresh_failures = prometheus::IntCounter::new(
            "refresh_failures",
            "The number of refreshes that failed to load every page",
        )?;
        registry.register(Box::new(refresh_failures.clone()))?;

        let bid_attempts = prometheus::IntCounterVec::new(
            prometheus::Opts::new("bid_attempts", "Bid submissions by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(bid_attempts.clone()))?;

        Ok(Self {
            cached_listings,
            pages_fetched,
            last_refresh,
            refresh_failures,
            bid_attempts,
        })
    }

    /// `outcome` is one of "rejected", "failed" or "placed".
    pub fn count_bid(&self, outcome: &str) {
        self.bid_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn bids(&self, outcome: &str) -> u64 {
        self.bid_attempts.with_label_values(&[outcome]).get()
    }
}

pub fn encode(registry: &prometheus::Registry) -> Result<String, prometheus::Error> {
    let encoder = prometheus::TextEncoder::new();
    let metrics_families = registry.gather();
    encoder.encode_to_string(&metrics_families)
}
