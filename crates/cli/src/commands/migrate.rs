use crate::commands::{open_pool, prepare, CommandFailure, CommandResult};
use perfumery_db::migrations;

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let outcome = apply(&pool).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(applied) => CommandResult::success(
            "migrate",
            format!("catalog schema is current ({applied} migrations applied)"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

async fn apply(pool: &perfumery_db::DbPool) -> Result<i64, CommandFailure> {
    let migration_failure = |error: String| ("migration", error, 5u8);

    migrations::run_pending(pool).await.map_err(|error| migration_failure(error.to_string()))?;

    let schema_present = migrations::catalog_schema_present(pool)
        .await
        .map_err(|error| migration_failure(error.to_string()))?;
    if !schema_present {
        return Err(migration_failure(format!(
            "catalog tables missing after migration: {}",
            migrations::CATALOG_TABLES.join(", ")
        )));
    }

    migrations::applied_count(pool).await.map_err(|error| migration_failure(error.to_string()))
}
