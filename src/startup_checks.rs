use crate::{Config, DEFAULT_PREVIEW_SECRET};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// Templates every page render depends on.
pub const REQUIRED_TEMPLATES: [&str; 4] = [
    "index.html.liquid",
    "post.html.liquid",
    "_header.html.liquid",
    "_footer.html.liquid",
];

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Templates directory does not exist: {0}")]
    TemplateDirectoryMissing(String),

    #[error("Required template missing: {0}")]
    RequiredTemplateMissing(String),

    #[error("Static files directory does not exist")]
    StaticDirectoryMissing,

    #[error("Content API endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),

    #[error("Preview secret is still the default value")]
    DefaultPreviewSecret,
}

impl StartupCheckError {
    /// Critical failures stop the server from starting.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            StartupCheckError::TemplateDirectoryMissing(_)
                | StartupCheckError::RequiredTemplateMissing(_)
                | StartupCheckError::InvalidEndpoint(_)
        )
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let templates_dir = Path::new(&config.templates.directory);
    if !templates_dir.exists() {
        error!("Templates directory does not exist: {:?}", templates_dir);
        errors.push(StartupCheckError::TemplateDirectoryMissing(
            templates_dir.display().to_string(),
        ));
    } else {
        info!("Templates directory exists: {:?}", templates_dir);
        for template in REQUIRED_TEMPLATES {
            if !templates_dir.join(template).exists() {
                error!("Required template missing: {}", template);
                errors.push(StartupCheckError::RequiredTemplateMissing(
                    template.to_string(),
                ));
            }
        }
    }

    let static_dir = Path::new(&config.static_files.directory);
    if !static_dir.exists() {
        warn!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing);
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    if let Err(e) = Url::parse(&config.content.endpoint) {
        error!("Invalid content API endpoint {}: {}", config.content.endpoint, e);
        errors.push(StartupCheckError::InvalidEndpoint(
            config.content.endpoint.clone(),
        ));
    }

    if config.app.preview_secret == DEFAULT_PREVIEW_SECRET {
        warn!("Preview cookies are signed with the default secret");
        errors.push(StartupCheckError::DefaultPreviewSecret);
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
