use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use bugtrack::db::Database;
use bugtrack::seed;

pub const DATA_DIR: &str = ".bugtrack";
pub const STORE_FILE: &str = "store.db";

/// Create `data_dir` and a seeded store inside it.
pub fn run(data_dir: &Path, force: bool) -> Result<()> {
    let store_path = data_dir.join(STORE_FILE);

    if store_path.exists() && !force {
        println!("Already initialized at {}", data_dir.display());
        println!("Use --force to reset the store to demo data.");
        return Ok(());
    }

    fs::create_dir_all(data_dir).context("Failed to create .bugtrack directory")?;

    if force && store_path.exists() {
        fs::remove_file(&store_path).context("Failed to remove existing store")?;
    }

    let db = Database::open(&store_path).context("Failed to create store")?;
    seed::initialize_demo_data(&db)?;

    println!("Initialized bugtrack in {}", data_dir.display());
    println!("Log in with 'bugtrack login demo' (any password).");
    Ok(())
}
