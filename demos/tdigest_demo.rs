use tdigest_oxide::common::Mergeable;
use tdigest_oxide::quantiles::{Scaler, TDigest};

fn main() {
    println!("=== T-Digest Demo: Uniform Stream ===");
    let mut td = TDigest::with_compression(100.0).unwrap();
    for i in 0..10_000 {
        td.update(i as f64);
    }

    println!("Count: {}", td.count());
    println!("Min: {}", td.min());
    println!("Max: {}", td.max());
    println!("p50: {:.2}", td.quantile(0.5));
    println!("p90: {:.2}", td.quantile(0.9));
    println!("p99: {:.2}", td.quantile(0.99));
    println!("p99.9: {:.2}", td.quantile(0.999));
    println!("cdf(9900): {:.4}", td.cdf(9900.0));

    println!("\n=== T-Digest Demo: Merge ===");
    let mut sketch1 = TDigest::with_compression(100.0).unwrap();
    let mut sketch2 = TDigest::with_compression(100.0).unwrap();

    for i in 0..5_000 {
        sketch1.update(i as f64);
    }
    for i in 5_000..10_000 {
        sketch2.update(i as f64);
    }

    sketch1.merge(&sketch2).unwrap();
    println!("Merged p50: {:.2}", sketch1.quantile(0.5));
    println!("Merged centroid count: {}", sketch1.centroid_count());

    println!("\n=== T-Digest Demo: Scale Function Comparison ===");
    for scaler in [Scaler::K1, Scaler::K2, Scaler::K3, Scaler::KQuadratic] {
        let mut td = TDigest::with_scaler(100.0, scaler).unwrap();
        for i in 0..10_000 {
            td.update(i as f64);
        }
        println!(
            "{:?}: centroids = {}, p99.9 = {:.2}",
            scaler,
            td.centroid_count(),
            td.quantile(0.999)
        );
    }

    println!("\n=== T-Digest Demo: Temporal Decay ===");
    let mut decayed = TDigest::with_decay(100.0, 0.9, 1000).unwrap();
    for i in 0..5_000 {
        decayed.update(i as f64);
    }
    println!("Decayed p50: {:.2}", decayed.quantile(0.5));

    println!("\n=== T-Digest Demo: Serialization Round-Trip ===");
    let bytes = sketch1.clone().to_bytes();
    println!("Serialized to {} bytes", bytes.len());
    let mut restored = TDigest::from_bytes(&bytes).unwrap();
    println!("Restored p50: {:.2}", restored.quantile(0.5));
}
