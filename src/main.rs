use stress_test::{stress_test_paused_flood, stress_test_scaling};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start tokio runtime: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(async_main()) {
        eprintln!("stress test failed: {}", e);
        std::process::exit(1);
    }
}

async fn async_main() -> topofeed_sdk::Result<()> {
    // Run async stress tests
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: a few sources, default capacity
    let stats = stress_test_paused_flood(4, 250, 100, 1).await?;
    stats.print();

    // Test 2: many sources, tight queue
    let stats = stress_test_paused_flood(16, 1000, 20, 1).await?;
    stats.print();

    // Test 3: Scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS                                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(200, 50).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
