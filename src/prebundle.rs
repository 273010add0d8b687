//! Dependency pre-bundling loader.
//!
//! The host's pre-bundler only knows file extensions. This loader tells it
//! which script dialect a `.js` or `.vue` file really contains, so embedded
//! markup is not rejected as a syntax error before the plugin sees it.

use std::path::Path;
use std::sync::Arc;

use crate::error::PluginError;
use crate::sfc::jsx::{MarkupDetector, RegexMarkupDetector};
use crate::sfc::scan::scan_blocks;

/// Files under this directory are left to the pre-bundler.
const NODE_MODULES: &str = "node_modules";

/// Script dialect handed to the pre-bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
}

impl Loader {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Js => "js",
            Self::Jsx => "jsx",
            Self::Ts => "ts",
            Self::Tsx => "tsx",
        }
    }

    fn from_lang(lang: &str) -> Option<Self> {
        match lang {
            "jsx" => Some(Self::Jsx),
            "ts" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }
}

/// What the loader hands back for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScript {
    pub contents: String,
    pub loader: Loader,
}

pub struct PrebundleLoader {
    detector: Arc<dyn MarkupDetector>,
}

impl Default for PrebundleLoader {
    fn default() -> Self {
        Self::new(Arc::new(RegexMarkupDetector::default()))
    }
}

impl PrebundleLoader {
    pub const NAME: &'static str = "custom-jsx-loader";

    pub fn new(detector: Arc<dyn MarkupDetector>) -> Self {
        Self { detector }
    }

    /// Read `path` and pick its loader. `Ok(None)` defers to the host.
    pub async fn load(&self, path: &Path) -> Result<Option<LoadedScript>, PluginError> {
        if !Self::handles(path) {
            return Ok(None);
        }
        let code = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PluginError::Io(path.to_path_buf(), e))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("js") => Ok(self.load_js(code)),
            Some("vue") => self.load_vue(&code, path).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether `path` is a `.js`/`.vue` file outside `node_modules`.
    pub fn handles(path: &Path) -> bool {
        let in_deps = path.components().any(|c| c.as_os_str() == NODE_MODULES);
        let ext = path.extension().and_then(|ext| ext.to_str());
        !in_deps && matches!(ext, Some("js" | "vue"))
    }

    /// Plain scripts are only claimed when they contain markup.
    fn load_js(&self, code: String) -> Option<LoadedScript> {
        self.detector
            .looks_like_markup(&code)
            .then_some(LoadedScript {
                contents: code,
                loader: Loader::Jsx,
            })
    }

    /// Component documents yield their last `<script>` body.
    ///
    /// An explicit `lang` wins; otherwise sniffing may upgrade to `jsx`. The
    /// chosen loader carries over between script elements.
    fn load_vue(&self, code: &str, path: &Path) -> Result<LoadedScript, PluginError> {
        let blocks = scan_blocks(code).map_err(|e| PluginError::Parse {
            path: path.display().to_string(),
            line: e.line,
            column: e.column,
            message: e.message,
        })?;

        let mut loaded = LoadedScript {
            contents: String::new(),
            loader: Loader::Js,
        };
        for block in blocks.iter().filter(|b| b.tag == "script") {
            let content = &code[block.content.clone()];
            let lang = block.attrs.get("lang").and_then(|v| v.as_str());
            if let Some(loader) = lang.and_then(Loader::from_lang) {
                loaded.loader = loader;
            } else if self.detector.looks_like_markup(content) {
                loaded.loader = Loader::Jsx;
            }
            loaded.contents = content.to_string();
        }
        Ok(loaded)
    }
}
