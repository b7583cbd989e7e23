// Host telemetry: system samples from sysinfo, component samples from one-shot Docker stats.

use super::stats;
use crate::models::{Component, NewComponentSample, NewSystemSample};
use crate::source::MetricsSource;
use crate::units::{format_bytes, format_rate, percent};
use bollard::Docker;
use bollard::query_parameters::StatsOptions;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

struct HostProbe {
    sys: System,
    disks: Disks,
    networks: Networks,
    last_network_refresh: Option<Instant>,
}

impl HostProbe {
    fn sample(&mut self) -> NewSystemSample {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.disks.refresh(false);
        self.networks.refresh(true);

        let total_mem = self.sys.total_memory();
        let used_mem = total_mem.saturating_sub(self.sys.available_memory());

        let (disk_total, disk_available) = self
            .disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(t, a), d| {
                (t + d.total_space(), a + d.available_space())
            });

        // received()/transmitted() are deltas since the previous refresh.
        let now = Instant::now();
        let moved: u64 = self
            .networks
            .list()
            .values()
            .map(|data| data.received() + data.transmitted())
            .sum();
        let rate = match self.last_network_refresh {
            Some(prev) => {
                let dt = now.duration_since(prev).as_secs_f64();
                if dt > 0.0 { moved as f64 / dt } else { 0.0 }
            }
            None => 0.0,
        };
        self.last_network_refresh = Some(now);

        NewSystemSample {
            timestamp: chrono::Utc::now(),
            cpu_usage: self.sys.global_cpu_usage().round().clamp(0.0, 100.0) as u8,
            memory_usage: format_bytes(used_mem),
            memory_total: format_bytes(total_mem),
            disk_usage: percent(disk_total.saturating_sub(disk_available), disk_total),
            disk_total: format_bytes(disk_total),
            network_io: format_rate(rate),
        }
    }
}

pub struct HostMetricsSource {
    probe: Arc<Mutex<HostProbe>>,
    docker: Docker,
}

impl HostMetricsSource {
    pub fn new(docker: Docker) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            probe: Arc::new(Mutex::new(HostProbe {
                sys,
                disks: Disks::new_with_refreshed_list(),
                networks: Networks::new_with_refreshed_list(),
                last_network_refresh: None,
            })),
            docker,
        }
    }
}

#[async_trait::async_trait]
impl MetricsSource for HostMetricsSource {
    #[instrument(skip(self), fields(source = "sysinfo", operation = "fetch_system_sample"))]
    async fn fetch_system_sample(&self) -> anyhow::Result<NewSystemSample> {
        let probe = self.probe.clone();
        tokio::task::spawn_blocking(move || {
            let mut probe = probe
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            Ok(probe.sample())
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip_all, fields(source = "docker", operation = "fetch_component_sample", component = %component.name))]
    async fn fetch_component_sample(
        &self,
        component: &Component,
    ) -> anyhow::Result<NewComponentSample> {
        let target = component.container_ref();
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(target, Some(options));
        let response = stream
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("no stats returned for {}", target))??;
        stats::process_statistics(&response, chrono::Utc::now())
            .ok_or_else(|| anyhow::anyhow!("incomplete stats for {}", target))
    }
}
