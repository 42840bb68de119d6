//! Prompt assembly from the analysis template.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Placeholder in the template that receives the applicant's history.
const HISTORY_PLACEHOLDER: &str = "{{user_credit_history}}";

/// Fill the prompt template with the applicant's credit history and write the
/// result next to the other per-topic artifacts.
///
/// # Errors
///
/// Returns an error if the template cannot be read or the prompt cannot be
/// written.
pub async fn generate_prompt(
    template_path: &Path,
    out_path: &Path,
    user_credit_history: &str,
) -> Result<()> {
    let template = tokio::fs::read_to_string(template_path)
        .await
        .with_context(|| {
            format!(
                "Failed to read prompt template: {}",
                template_path.display()
            )
        })?;

    let prompt = template.replace(HISTORY_PLACEHOLDER, user_credit_history);

    if let Some(parent) = out_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(out_path, prompt)
        .await
        .with_context(|| format!("Failed to write prompt: {}", out_path.display()))?;

    info!(path = %out_path.display(), "Prompt written");
    Ok(())
}
