use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use {tracing_subscriber::layer::SubscriberExt, tracing_subscriber::util::SubscriberInitExt};

pub struct Tracing {}

impl Tracing {
    /// Log to stderr at `level`. With the `tracing` feature, spans also go to Tracy.
    pub fn setup(level: LevelFilter) -> Self {
        let fmt = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(level);
        let registry = tracing_subscriber::registry().with(fmt);
        #[cfg(feature = "tracing")]
        let _ = registry
            .with(tracing_tracy::TracyLayer::default())
            .try_init();
        #[cfg(not(feature = "tracing"))]
        let _ = registry.try_init();
        Self {}
    }
}
