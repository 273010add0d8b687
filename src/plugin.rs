//! Host hook surface.
//!
//! [`VuePlugin`] owns every piece of per-plugin state (options, descriptor
//! cache, back ends, filter) and exposes the bundler lifecycle:
//!
//! ```text
//! config -> config_resolved -> configure_server
//!        -> resolve_id -> load -> transform        (per module)
//!        -> handle_hot_update                      (per edit)
//! ```

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::cache::DescriptorCache;
use crate::compiler::backend::{Backends, CompiledModule};
use crate::compiler::filter::ModuleFilter;
use crate::compiler::{self, TransformContext};
use crate::config::{ConfigError, ResolvedOptions};
use crate::error::PluginError;
use crate::prebundle::{LoadedScript, PrebundleLoader};
use crate::reload::{self, HmrContext, HotUpdate};
use crate::router::{self, LoadResult};
use crate::sfc::DescriptorBuilder;
use crate::sfc::jsx::{MarkupDetector, RegexMarkupDetector};

/// Host configuration returned from the `config` hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostConfigPatch {
    /// Ids the host's own script transpiler keeps handling.
    pub script_include: String,
    /// Ids taken away from the host's script transpiler.
    pub script_exclude: String,
    /// Loader plugins registered into dependency pre-bundling.
    pub prebundle_loaders: Vec<&'static str>,
}

pub struct VuePlugin {
    options: ResolvedOptions,
    cache: DescriptorCache,
    builder: DescriptorBuilder,
    backends: Backends,
    filter: ModuleFilter,
    prebundle: PrebundleLoader,
}

impl VuePlugin {
    pub const NAME: &'static str = "vite-plugin-vue2";

    pub fn new(options: ResolvedOptions) -> Result<Self, ConfigError> {
        let filter = ModuleFilter::new(&options.include, &options.exclude)
            .map_err(|e| ConfigError::Validation(format!("include/exclude: {e}")))?;
        let detector: Arc<dyn MarkupDetector> = Arc::new(RegexMarkupDetector::default());

        Ok(Self {
            options,
            cache: DescriptorCache::new(),
            builder: DescriptorBuilder::default().with_detector(Arc::clone(&detector)),
            backends: Backends::default(),
            filter,
            prebundle: PrebundleLoader::new(detector),
        })
    }

    pub fn with_backends(mut self, backends: Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_builder(mut self, builder: DescriptorBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Swap the markup sniffer used by descriptor construction, dispatch and
    /// pre-bundling.
    pub fn with_detector(mut self, detector: Arc<dyn MarkupDetector>) -> Self {
        self.builder = self.builder.with_detector(Arc::clone(&detector));
        self.prebundle = PrebundleLoader::new(detector);
        self
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Whether a document path passes the include/exclude filter.
    pub fn handles(&self, file: &str) -> bool {
        self.filter.matches(file)
    }

    // ========================================================================
    // lifecycle
    // ========================================================================

    /// With `jsx` enabled, hand `.jsx`/`.tsx` to this plugin and register
    /// the pre-bundle loader.
    pub fn config(&self) -> Option<HostConfigPatch> {
        self.options.jsx.then(|| HostConfigPatch {
            script_include: r"\.ts$".to_string(),
            script_exclude: r"\.(tsx|jsx)$".to_string(),
            prebundle_loaders: vec![PrebundleLoader::NAME],
        })
    }

    pub fn config_resolved(&mut self, root: impl Into<PathBuf>, is_production: bool) {
        self.options.root = root.into();
        self.options.is_production = is_production;
    }

    pub fn configure_server(&mut self) {
        self.options.dev_server = true;
    }

    // ========================================================================
    // module hooks
    // ========================================================================

    pub fn resolve_id(&self, id: &str) -> Option<String> {
        router::resolve_id(id)
    }

    pub async fn load(&self, id: &str) -> Result<Option<LoadResult>, PluginError> {
        router::load(id, &self.cache).await
    }

    pub async fn transform(&self, code: &str, id: &str) -> Result<Option<CompiledModule>, PluginError> {
        compiler::transform(code, id, &self.context()).await
    }

    /// Pre-bundle loader hook.
    pub async fn prebundle(&self, path: &Path) -> Result<Option<LoadedScript>, PluginError> {
        self.prebundle.load(path).await
    }

    /// Hot-update hook. Files outside the filter are ignored.
    pub async fn handle_hot_update<F>(&self, ctx: HmrContext<'_>, read: F) -> Result<Option<HotUpdate>, PluginError>
    where
        F: Future<Output = io::Result<String>>,
    {
        if !self.filter.matches(ctx.file) {
            return Ok(None);
        }
        reload::handle_hot_update(ctx, read, &self.builder, &self.options, &self.cache).await
    }

    fn context(&self) -> TransformContext<'_> {
        TransformContext {
            options: &self.options,
            cache: &self.cache,
            builder: &self.builder,
            backends: &self.backends,
            filter: &self.filter,
        }
    }
}
