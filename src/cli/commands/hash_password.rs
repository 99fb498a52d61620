use crate::config::Config;
use crate::services::hash_password;

pub fn cmd_hash_password(config: &Config, password: &str) -> anyhow::Result<()> {
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let hash = hash_password(password, &config.security)?;

    println!("{hash}");
    println!();
    println!("Add it to config.toml:");
    println!("  [auth]");
    println!("  password_hash = \"{hash}\"");
    println!("or export AUTH_PASSWORD_HASH='{hash}'");

    Ok(())
}
