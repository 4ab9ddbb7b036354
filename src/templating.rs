use liquid::partials::{EagerCompiler, InMemorySource};
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Partials are the `_*.html.liquid` files in the template directory,
/// included by file name: `{% include "_header.html.liquid" %}`.
const PARTIAL_PREFIX: char = '_';
const TEMPLATE_SUFFIX: &str = ".html.liquid";

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Reads a template, re-reading it only when the file changed on disk.
    pub async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", path);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    async fn partial_names(&self) -> Result<Vec<String>, String> {
        let mut entries = tokio::fs::read_dir(&self.template_dir)
            .await
            .map_err(|e| format!("Failed to read template directory: {}", e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| format!("Failed to read template directory: {}", e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(PARTIAL_PREFIX) && name.ends_with(TEMPLATE_SUFFIX) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn partials(&self) -> Result<InMemorySource, String> {
        let mut source = InMemorySource::new();
        for name in self.partial_names().await? {
            let content = self.load_template(&name).await?;
            source.add(name, content);
        }
        Ok(source)
    }

    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;
        let partials = self.partials().await?;

        let parser = liquid::ParserBuilder::with_stdlib()
            .partials(EagerCompiler::new(partials))
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(&template_content)
            .map_err(|e| format!("Failed to parse template {}: {}", template_name, e))?;

        template
            .render(&globals)
            .map_err(|e| format!("Failed to render template {}: {}", template_name, e))
    }
}
