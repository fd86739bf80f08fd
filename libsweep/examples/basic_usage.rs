//! Basic usage example for the Sweep library.
//!
//! Previews which tags of a namespace a retention policy would delete,
//! without deleting anything.
//!
//! Run with: SCW_SECRET_KEY=... cargo run --example basic_usage -- <namespace>

use libsweep::format::format_age;
use libsweep::retention::parse_grace;
use libsweep::{Credentials, RetentionPolicy, Sweeper, TagStatus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sweep Library - Basic Usage Example\n");

    let Some(namespace) = std::env::args().nth(1) else {
        eprintln!("usage: basic_usage <namespace>");
        return Ok(());
    };
    let Ok(secret) = std::env::var("SCW_SECRET_KEY") else {
        eprintln!("✗ SCW_SECRET_KEY is not set");
        return Ok(());
    };

    let sweeper = Sweeper::builder()
        .with_credentials(Credentials::Token(secret))
        .build()?;
    println!("✓ Using registry API: {}\n", sweeper.client().base_url());

    // Keep the three newest tags of every image, delete the rest once they
    // are a week old.
    let policy = RetentionPolicy::new()
        .with_grace(parse_grace("168hr")?)
        .with_keep(3)
        .excluding([TagStatus::Deleting, TagStatus::Locked]);

    println!("Planning sweep of '{}'...", namespace);
    match sweeper.plan(&namespace, &policy).await {
        Ok(plan) if plan.is_empty() => println!("✓ Nothing to delete"),
        Ok(plan) => {
            println!("✓ {} tags would be deleted:\n", plan.len());
            for (image, tags) in &plan.images {
                if tags.is_empty() {
                    continue;
                }
                println!("  {}", image);
                for tag in tags {
                    let (days, hours) = tag.age();
                    println!("    - {} ({})", tag.reference(), format_age(days, hours));
                }
            }
        }
        Err(e) => eprintln!("✗ Failed to plan sweep: {}", e),
    }

    sweeper.close();
    Ok(())
}
