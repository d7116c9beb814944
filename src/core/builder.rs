use std::sync::Arc;

use crate::{
    core::SupervisorConfig,
    events::Bus,
    subscribers::{ObserverSubscriber, Subscribe, SubscriberSet, WorkerObserver},
    template::TemplateSource,
};
use super::{
    resolve::{HostResolver, SystemResolver},
    shared::Shared,
    supervisor::Supervisor,
    wake::{NoWakeLock, WakeLock},
};

/// Builder for constructing a Supervisor with optional hooks.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    template: TemplateSource,
    subscribers: Vec<Arc<dyn Subscribe>>,
    observer: Option<Arc<dyn WorkerObserver>>,
    wake_lock: Arc<dyn WakeLock>,
    resolver: Arc<dyn HostResolver>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration and config template.
    pub fn new(cfg: SupervisorConfig, template: TemplateSource) -> Self {
        Self {
            cfg,
            template,
            subscribers: Vec::new(),
            observer: None,
            wake_lock: Arc::new(NoWakeLock),
            resolver: Arc::new(SystemResolver),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every bus event (lifecycle, output status, failures)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the observer notified of state and status changes.
    ///
    /// Notifications reach it in the order they were published.
    pub fn with_observer(mut self, observer: Arc<dyn WorkerObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Sets the stay-awake hook held while a worker instance is alive.
    pub fn with_wake_lock(mut self, wake_lock: Arc<dyn WakeLock>) -> Self {
        self.wake_lock = wake_lock;
        self
    }

    /// Sets the lookup used when `resolve_pool_host` is on.
    ///
    /// Defaults to [`SystemResolver`]. The lookup is bounded by
    /// `resolve_timeout` and abandoned when the start is superseded.
    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Must be called within a tokio runtime: the subscriber workers and the
    /// bus listener are spawned here.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let mut subscribers = self.subscribers;
        if let Some(observer) = self.observer {
            subscribers.push(Arc::new(ObserverSubscriber::new(observer)));
        }
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        let shared = Arc::new(Shared::new(
            bus,
            self.cfg.log_max_len,
            self.cfg.log_prune_offset,
        ));

        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.template,
            shared,
            subs,
            self.wake_lock,
            self.resolver,
        ))
    }
}
