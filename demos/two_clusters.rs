//! Mapper graph of two well-separated 2D clusters, with a 1D PCA lens.

use mapfit::{run_mapper, CoverConfig, MapperParams, ProjectionConfig};

fn main() {
    tracing_subscriber::fmt::init();

    // Cluster A near the origin, cluster B near (5, 5), one outlier far away.
    let mut data: Vec<Vec<f32>> = Vec::new();
    for i in 0..5 {
        for j in 0..4 {
            data.push(vec![i as f32 * 0.1, j as f32 * 0.1]);
            data.push(vec![5.0 + i as f32 * 0.1, 5.0 + j as f32 * 0.1]);
        }
    }
    data.push(vec![2.5, 2.5]);

    let params = MapperParams::default()
        .with_projection(ProjectionConfig::pca(1))
        .with_cover(CoverConfig::new(5, 0.3));

    let run = match run_mapper(&data, params) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("mapper failed: {e}");
            std::process::exit(1);
        }
    };

    println!("=== parameters ===");
    println!("  cover     {:?}", run.params.cover);
    println!("  clusterer {:?}", run.params.clusterer);

    println!("\n=== nodes ===");
    for node in run.graph.nodes() {
        println!("  {:18} members {:?}", node.id, node.members);
    }

    println!("\n=== links ===");
    for (from, to) in run.graph.links() {
        println!("  {from} -> {}", to.join(", "));
    }

    println!("\n=== components ===");
    for (i, component) in run.graph.connected_components().iter().enumerate() {
        let ids: Vec<&str> = component
            .iter()
            .map(|&n| run.graph.nodes()[n].id.as_str())
            .collect();
        println!("  component {i}: {}", ids.join(", "));
    }

    let unclustered = run.graph.unclustered_points();
    println!("\n=== unclustered rows (noise or skipped elements) ===");
    println!("  {unclustered:?}");
}
