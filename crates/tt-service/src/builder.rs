//! Fluent builder for constructing a [`TransitService`].

use std::sync::Mutex;

use tracing::info;

use tt_analytics::{AnalyticsStore, Classifier, ClassifierWeights, JsonFileStore, PatternAnalytics};
use tt_core::TrackerConfig;
use tt_session::{SessionTracker, Windows};
use tt_spatial::{RouteMatcher, RouteSource, RouteStore, StoreConfig};

use crate::{AnyRider, NoopObserver, RiderDirectory, ServiceResult, TransitService, TripObserver};

/// Fluent builder for [`TransitService<S>`].
///
/// # Required inputs
///
/// - `S: RouteSource`: where raw route geometries come from
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                                          |
/// |------------------------|--------------------------------------------------|
/// | `.config(c)`           | `TrackerConfig::default()`                       |
/// | `.directory(d)`        | `AnyRider`                                       |
/// | `.observer(o)`         | `NoopObserver`                                   |
/// | `.analytics_store(s)`  | `JsonFileStore` at `config.analytics_path`, or none |
/// | `.weights(w)`          | `ClassifierWeights::default()`                   |
///
/// # Example
///
/// ```rust,ignore
/// let service = TransitServiceBuilder::new(CsvRouteSource::new("routes.csv"))
///     .config(config)
///     .observer(TripOutputObserver::new(CsvTripWriter::new(dir)?))
///     .build()?;
/// service.load_routes()?;
/// let outcome = service.process_ping("42", 52.52, 13.40, None)?;
/// ```
pub struct TransitServiceBuilder<S: RouteSource> {
    source:          S,
    config:          TrackerConfig,
    directory:       Option<Box<dyn RiderDirectory>>,
    observer:        Option<Box<dyn TripObserver>>,
    analytics_store: Option<Box<dyn AnalyticsStore>>,
    weights:         ClassifierWeights,
}

impl<S: RouteSource> TransitServiceBuilder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            config:          TrackerConfig::default(),
            directory:       None,
            observer:        None,
            analytics_store: None,
            weights:         ClassifierWeights::default(),
        }
    }

    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Restrict pings to registered riders.
    pub fn directory(mut self, directory: impl RiderDirectory + 'static) -> Self {
        self.directory = Some(Box::new(directory));
        self
    }

    /// Receive every finished trip.
    pub fn observer(mut self, observer: impl TripObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Persist analytics somewhere other than `config.analytics_path`.
    pub fn analytics_store(mut self, store: impl AnalyticsStore + 'static) -> Self {
        self.analytics_store = Some(Box::new(store));
        self
    }

    pub fn weights(mut self, weights: ClassifierWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Validate the configuration, restore saved analytics and return a
    /// ready service.
    ///
    /// Routes are not loaded here; call
    /// [`load_routes`](TransitService::load_routes) before the first ping.
    /// A saved analytics snapshot that cannot be read fails the build.
    pub fn build(self) -> ServiceResult<TransitService<S>> {
        self.config.validate()?;

        let analytics_store = self.analytics_store.or_else(|| {
            self.config
                .analytics_path
                .as_ref()
                .map(|p| Box::new(JsonFileStore::new(p.clone())) as Box<dyn AnalyticsStore>)
        });

        let classifier = Classifier::new(self.weights);
        let analytics = match analytics_store.as_ref().map(|s| s.load()).transpose()?.flatten() {
            Some(snapshot) => {
                info!(
                    routes = snapshot.usage.routes().len(),
                    patterns = snapshot.patterns.len(),
                    "restored analytics snapshot"
                );
                PatternAnalytics::from_snapshot(snapshot, classifier)
            }
            None => PatternAnalytics::new(classifier),
        };

        Ok(TransitService {
            store:           RouteStore::new(self.source, StoreConfig::from(&self.config)),
            matcher:         RouteMatcher::from(&self.config),
            tracker:         SessionTracker::new(Windows::from(&self.config)),
            analytics:       Mutex::new(analytics),
            analytics_store,
            save_lock:       Mutex::new(()),
            directory:       self.directory.unwrap_or_else(|| Box::new(AnyRider)),
            observer:        self.observer.unwrap_or_else(|| Box::new(NoopObserver)),
            config:          self.config,
        })
    }
}
