use anyhow::{anyhow, Result};

pub fn validate_data_dir(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("data_dir must not be empty"));
    }
    Ok(())
}

/// Interchange `lang` tag such as `zh-cn` or `en-us`.
pub fn validate_lang(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("lang must not be empty"));
    }
    if !trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(anyhow!("invalid lang '{}'", trimmed));
    }
    Ok(())
}
