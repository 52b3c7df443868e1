use crate::commands::{open_pool, prepare, CommandFailure, CommandResult};
use perfumery_db::{migrations, DemoCatalog, SeededProduct};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let outcome = seed_catalog(&pool).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(products) => CommandResult::success("seed", seeded_message(&products)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

async fn seed_catalog(pool: &perfumery_db::DbPool) -> Result<Vec<SeededProduct>, CommandFailure> {
    migrations::run_pending(pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;

    let seed_result = DemoCatalog::load(pool)
        .await
        .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

    let verification = DemoCatalog::verify(pool)
        .await
        .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

    if !verification.all_present {
        let failed_checks = verification
            .checks
            .iter()
            .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
            .collect::<Vec<_>>();
        return Err(("seed_verification", verification_failure_message(&failed_checks), 6u8));
    }

    Ok(seed_result.products_seeded)
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some demo products failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

fn seeded_message(products: &[SeededProduct]) -> String {
    let lines: Vec<String> = products
        .iter()
        .map(|product| format!("  - {} ({} reviews)", product.name, product.review_count))
        .collect();
    format!("Demo catalog loaded with {} products:\n{}", products.len(), lines.join("\n"))
}
