use masp_instance::Instance;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::time::Duration;

/// File the registry is dumped to, inside the output directory.
pub const METRICS_FILE: &str = "metrics.prom";

/// Prometheus collectors for one sweep run.
///
/// Collectors are updated from the rayon workers, so the struct is shared by
/// reference across jobs.
pub struct SweepMetrics {
    pub registry: Registry,
    /// Total number of instance files written.
    pub instances_written_total: IntCounter,
    /// Agents generated, labelled `anchored` or `floating`.
    pub agents_total: IntCounterVec,
    /// Total number of tasks across all written instances.
    pub tasks_total: IntCounter,
    /// Sum of `d_j` over every task written.
    pub demand_units_total: IntCounter,
    /// Distribution of the `p_ij` entries.
    pub success_probability: Histogram,
    /// Wall time spent generating and writing one instance.
    pub build_seconds: Histogram,
}

impl SweepMetrics {
    /// Creates and registers all collectors under the `masp_sweep` namespace.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("masp_sweep".into()), None)?;

        macro_rules! reg {
            ($m:expr) => {{
                let m = $m;
                registry.register(Box::new(m.clone()))?;
                m
            }};
        }

        Ok(Self {
            instances_written_total: reg!(IntCounter::new(
                "instances_written_total",
                "Instance files written"
            )?),
            agents_total: reg!(IntCounterVec::new(
                prometheus::Opts::new("agents_total", "Agents generated, by slot kind"),
                &["slot"]
            )?),
            tasks_total: reg!(IntCounter::new("tasks_total", "Tasks generated")?),
            demand_units_total: reg!(IntCounter::new(
                "demand_units_total",
                "Sum of minimum team sizes over all tasks"
            )?),
            success_probability: reg!(Histogram::with_opts(
                prometheus::HistogramOpts::new(
                    "success_probability",
                    "Distribution of p_ij entries"
                )
                .buckets(prometheus::linear_buckets(0.1, 0.1, 10)?)
            )?),
            build_seconds: reg!(Histogram::with_opts(
                prometheus::HistogramOpts::new(
                    "build_seconds",
                    "Time to generate one instance"
                )
                .buckets(prometheus::exponential_buckets(0.0001, 2.0, 16)?)
            )?),
            registry,
        })
    }

    /// Records one written instance.
    pub fn observe(&self, instance: &Instance, elapsed: Duration) {
        let floaters = instance.floater_count() as u64;
        let anchored = instance.agent_count() as u64 - floaters;
        self.instances_written_total.inc();
        self.agents_total.with_label_values(&["anchored"]).inc_by(anchored);
        self.agents_total.with_label_values(&["floating"]).inc_by(floaters);
        self.tasks_total.inc_by(instance.task_count() as u64);
        self.demand_units_total
            .inc_by(instance.demand().iter().map(|&d| u64::from(d)).sum());
        for p in instance.probabilities.iter().flatten() {
            self.success_probability.observe(*p);
        }
        self.build_seconds.observe(elapsed.as_secs_f64());
    }

    /// Mean `d_j` over every task observed so far.
    pub fn average_demand(&self) -> Option<f64> {
        let tasks = self.tasks_total.get();
        (tasks > 0).then(|| self.demand_units_total.get() as f64 / tasks as f64)
    }

    /// Text exposition of the registry.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masp_instance::{rng::seeded_rng, Catalog, InstanceBuilder, InstanceParams};

    #[test]
    fn observe_tracks_agents_and_demand() {
        let catalog = Catalog::drone_fleet().unwrap();
        let builder = InstanceBuilder::new(&catalog, InstanceParams::new(20, 4, 6)).unwrap();
        let metrics = SweepMetrics::new().unwrap();

        for seed in 0..3 {
            let instance = builder.build(&mut seeded_rng(seed)).unwrap();
            metrics.observe(&instance, Duration::from_millis(1));
        }

        assert_eq!(metrics.instances_written_total.get(), 3);
        assert_eq!(metrics.agents_total.with_label_values(&["anchored"]).get(), 42);
        assert_eq!(metrics.agents_total.with_label_values(&["floating"]).get(), 18);
        assert_eq!(metrics.success_probability.get_sample_count(), 3 * 20 * 4);
        assert_eq!(metrics.average_demand(), Some(14.0 / 4.0));

        let text = metrics.render().unwrap();
        assert!(text.contains("masp_sweep_instances_written_total 3"));
        assert!(text.contains("masp_sweep_agents_total{slot=\"floating\"} 18"));
    }

    #[test]
    fn average_demand_is_none_before_any_instance() {
        assert_eq!(SweepMetrics::new().unwrap().average_demand(), None);
    }
}
