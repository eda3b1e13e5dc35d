use std::fmt;
use std::sync::Arc;

use log::*;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use crate::registry::Registry;

/// Spawn the background sweep over `registry`: every `period`, streams whose
/// last activity is older than `idle_after` are retired — generator aborted
/// if one is still scheduled, attached tails woken so they end, entry
/// removed.
///
/// This is the only reclamation path for streams that go quiet instead of
/// reaching their configured limit. A disconnecting viewer never triggers
/// it: streams outlive their audience until the idle threshold does the
/// bookkeeping.
pub fn spawn<C>(
    registry: Arc<Registry<C>>,
    period: Duration,
    idle_after: Duration,
) -> JoinHandle<()>
where
    C: PartialEq + fmt::Debug + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reclaimed = sweep(&registry, idle_after);
            if reclaimed > 0 {
                info!("expiration sweep reclaimed {reclaimed} idle stream(s)");
            }
        }
    })
}

/// One sweep pass. Returns how many streams were reclaimed.
pub fn sweep<C: PartialEq + fmt::Debug>(registry: &Registry<C>, idle_after: Duration) -> usize {
    let now = Instant::now();
    let idle: Vec<_> = registry
        .snapshot()
        .into_iter()
        .filter(|stream| {
            let state = stream.state();
            now.duration_since(state.last_activity) > idle_after
        })
        .collect();

    for stream in &idle {
        debug!("stream {} idle past the threshold, reclaiming", stream.id());
        registry.retire(stream);
    }
    idle.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventStreamConfig;
    use crate::generator;
    use crate::stream::Phase;
    use tokio::time::sleep;

    const IDLE_AFTER: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn idle_streams_are_reclaimed() {
        let registry = Arc::new(Registry::new(8));
        let (stream, _) = registry.get_or_create("stale", EventStreamConfig::default());

        sleep(Duration::from_secs(301)).await;
        assert_eq!(sweep(&registry, IDLE_AFTER), 1);

        assert!(registry.get("stale").is_none());
        assert_eq!(stream.state().phase, Phase::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn recently_active_streams_are_spared() {
        let registry = Arc::new(Registry::new(8));
        registry.get_or_create("warm", EventStreamConfig::default());

        sleep(Duration::from_secs(100)).await;
        assert_eq!(sweep(&registry, IDLE_AFTER), 0);
        assert!(registry.get("warm").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn generated_events_count_as_activity() {
        let registry = Arc::new(Registry::new(8));
        let config = EventStreamConfig {
            interval: Duration::from_secs(10),
            ..Default::default()
        };
        let (stream, _) = registry.get_or_create("busy", config);
        generator::ensure_running(&registry, &stream);

        sleep(Duration::from_secs(400)).await;
        assert_eq!(sweep(&registry, IDLE_AFTER), 0);
        assert!(registry.get("busy").is_some());
        registry.delete("busy");
    }

    #[tokio::test(start_paused = true)]
    async fn a_slow_generator_does_not_keep_its_stream_alive() {
        let registry = Arc::new(Registry::new(8));
        let config = EventStreamConfig {
            interval: Duration::from_secs(600),
            ..Default::default()
        };
        let (stream, _) = registry.get_or_create("glacial", config);
        generator::ensure_running(&registry, &stream);
        assert!(stream.state().generator.is_some());

        sleep(Duration::from_secs(301)).await;
        assert_eq!(sweep(&registry, IDLE_AFTER), 1);
        assert!(registry.get("glacial").is_none());
        assert!(stream.state().generator.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnecting_after_reclamation_starts_fresh() {
        let registry = Arc::new(Registry::new(8));
        let (stream, _) = registry.get_or_create("lapsed", EventStreamConfig::default());
        stream.state().last_id = 12;

        sleep(Duration::from_secs(301)).await;
        sweep(&registry, IDLE_AFTER);

        let (fresh, created) = registry.get_or_create("lapsed", EventStreamConfig::default());
        assert!(created);
        assert_eq!(fresh.state().last_id, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn the_spawned_loop_sweeps_on_its_period() {
        let registry = Arc::new(Registry::new(8));
        registry.get_or_create("background", EventStreamConfig::default());

        let handle = spawn(registry.clone(), Duration::from_secs(60), IDLE_AFTER);
        sleep(Duration::from_secs(420)).await;

        assert!(registry.is_empty());
        handle.abort();
    }
}
