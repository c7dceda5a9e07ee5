use anyhow::Error;
use std::env;

/// reads `key` from the process env, loading a `.env` file first if present
pub fn get_env_var(key: &str) -> Result<String, Error> {
    dotenvy::dotenv().ok();
    Ok(env::var(key)?)
}
