use spacetime_core::{DeviationSignalBuilder, GeometryConfig, Metric, Observation};

fn main() {
    let cfg = GeometryConfig::from_json(r#"{"proper_time_step": 0.01}"#).unwrap();
    let builder = DeviationSignalBuilder::with_config(Metric::minkowski(1.0, 1.0), &cfg);

    let mut obs: Vec<Observation> = (0..10)
        .map(|i| Observation::new(i as f64, 100.0 + i as f64 * 0.01, 1000.0, 0.0))
        .collect();
    // 价格跳变
    obs.push(Observation::new(10.0, 200.0, 1000.0, 0.0));

    for (i, s) in builder.compute(&obs).iter().enumerate() {
        println!("{i:>2} tau={:.2} dev={:.6} valid={}", s.proper_time, s.deviation, s.valid);
    }
}
