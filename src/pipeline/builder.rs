use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AlignConfig;
use crate::error::AlignmentError;
use crate::lang::LanguageRegistry;
use crate::pipeline::runtime::{ReadAligner, ReadAlignerParts};
use crate::pipeline::traits::{AlignmentEngine, LanguageBackend};

pub struct ReadAlignerBuilder {
    config: AlignConfig,
    registry: Option<LanguageRegistry>,
    language_dirs: Vec<PathBuf>,
    backends: Vec<Arc<dyn LanguageBackend>>,
    engine: Option<Box<dyn AlignmentEngine>>,
}

impl ReadAlignerBuilder {
    pub fn new(config: AlignConfig) -> Self {
        Self {
            config,
            registry: None,
            language_dirs: Vec::new(),
            backends: Vec::new(),
            engine: None,
        }
    }

    /// Replace the bundled languages entirely.
    pub fn with_registry(mut self, registry: LanguageRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Load every `*.json` language file in `dir` on top of the registry.
    pub fn with_language_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.language_dirs.push(dir.into());
        self
    }

    pub fn with_language_backend(mut self, backend: Arc<dyn LanguageBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Without an engine the aligner can still prepare documents.
    pub fn with_engine(mut self, engine: Box<dyn AlignmentEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<ReadAligner, AlignmentError> {
        self.config.validate()?;

        let mut registry = match self.registry {
            Some(registry) => registry,
            None => LanguageRegistry::builtin()?.clone(),
        };
        for dir in &self.language_dirs {
            let added = registry.load_dir(dir)?;
            tracing::info!(dir = %dir.display(), languages = added, "loaded language directory");
        }
        for backend in self.backends {
            registry.register(backend);
        }
        for lang in &self.config.g2p_fallbacks {
            if !registry.contains(lang) {
                tracing::warn!(lang = %lang, "fallback language has no converter");
            }
        }

        Ok(ReadAligner::from_parts(ReadAlignerParts {
            config: self.config,
            registry,
            engine: self.engine,
        }))
    }
}
