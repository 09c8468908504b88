//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use muzikax_core::UserProfile;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print the fields of a user profile.
pub fn profile(profile: &UserProfile) {
    field("ID", &profile.id);
    field("Name", &profile.name);
    field("Email", &profile.email);
    if let Some(role) = &profile.role {
        field("Role", role);
    }
    if let Some(creator_type) = &profile.creator_type {
        field("Creator type", creator_type);
    }
    field("Followers", &profile.followers_count.to_string());
}
