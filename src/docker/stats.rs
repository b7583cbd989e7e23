// Turn a raw Docker stats response into a component sample.

use crate::models::{NewComponentSample, ScalarMap, ScalarValue};
use crate::units::{format_bytes, percent};
use bollard::models::ContainerStatsResponse;
use chrono::{DateTime, Utc};

/// Sums read/write bytes from blkio entries (op names compared case-insensitively).
fn block_io(s: &ContainerStatsResponse) -> (u64, u64) {
    s.blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_ref())
        .map_or((0, 0), |entries| {
            let mut read = 0u64;
            let mut write = 0u64;
            for e in entries {
                let op = e.op.as_deref().unwrap_or_default();
                if op.eq_ignore_ascii_case("read") {
                    read += e.value.unwrap_or(0);
                } else if op.eq_ignore_ascii_case("write") {
                    write += e.value.unwrap_or(0);
                }
            }
            (read, write)
        })
}

/// None when the response lacks the CPU blocks needed for a delta (e.g. first stats frame).
pub(crate) fn process_statistics(
    s: &ContainerStatsResponse,
    observed_at: DateTime<Utc>,
) -> Option<NewComponentSample> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;
    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_percent = if system_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let mem_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let mem_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);

    let (rx, tx) = s.networks.as_ref().map_or((0u64, 0u64), |n| {
        n.values().fold((0, 0), |(rx, tx), v| {
            (rx + v.rx_bytes.unwrap_or(0), tx + v.tx_bytes.unwrap_or(0))
        })
    });
    let (block_read, block_write) = block_io(s);

    let pids = s.pids_stats.as_ref().and_then(|p| p.current);
    let throttled = cpu_stats
        .throttling_data
        .as_ref()
        .is_some_and(|t| t.throttled_periods.unwrap_or(0) > 0);

    let mut additional = ScalarMap::new();
    additional.insert("networkRx".into(), format_bytes(rx).into());
    additional.insert("networkTx".into(), format_bytes(tx).into());
    additional.insert("blockRead".into(), format_bytes(block_read).into());
    additional.insert("blockWrite".into(), format_bytes(block_write).into());
    if mem_limit > 0 {
        additional.insert("memoryLimit".into(), format_bytes(mem_limit).into());
        additional.insert(
            "memoryPercent".into(),
            ScalarValue::Int(percent(mem_usage, mem_limit) as i64),
        );
    }
    additional.insert("cpuThrottled".into(), throttled.into());

    Some(NewComponentSample {
        timestamp: observed_at,
        cpu_usage: cpu_percent.round().clamp(0.0, 100.0) as u8,
        memory_usage: format_bytes(mem_usage),
        task_count: pids.map(|p| p.min(u32::MAX as u64) as u32),
        additional_metrics: additional,
    })
}
