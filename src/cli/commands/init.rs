use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with default settings.");
        println!();
        println!("Next steps:");
        println!("  1. showtracker hash-password '<household password>'");
        println!("  2. put the hash under [auth] password_hash");
        println!("  3. set SESSION_SECRET to at least 64 random characters");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }

    Ok(())
}
