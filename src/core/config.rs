use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeSchemaConfig {
    pub compiler: CompilerConfig,
    pub crawler: CrawlerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Skip the implicit `value:url` slicing every extension list declares
    /// when no slice actually follows it.
    pub elide_default_extension_slicing: bool,
    pub strip_base_description_prefix: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub debug: bool,
    pub skip_untyped_slices: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            elide_default_extension_slicing: true,
            strip_base_description_prefix: true,
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            skip_untyped_slices: true,
        }
    }
}

impl TypeSchemaConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_compiler_config(mut self, compiler: CompilerConfig) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_crawler_config(mut self, crawler: CrawlerConfig) -> Self {
        self.crawler = crawler;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.crawler.debug = debug;
        self
    }
}

impl CompilerConfig {
    pub fn with_extension_slicing_elision(mut self, enabled: bool) -> Self {
        self.elide_default_extension_slicing = enabled;
        self
    }

    pub fn with_description_prefix_stripping(mut self, enabled: bool) -> Self {
        self.strip_base_description_prefix = enabled;
        self
    }
}
